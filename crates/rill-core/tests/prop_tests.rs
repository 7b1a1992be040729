use proptest::prelude::*;

use rill_core::error::RillError;
use rill_core::result::StepResult;
use rill_core::stream::channel;

// ---------------------------------------------------------------------------
// Property-based tests for the stream invariants
// ---------------------------------------------------------------------------

proptest! {
    // 1. Items are observed in exactly the order the producer emitted them.
    #[test]
    fn stream_preserves_production_order(values in proptest::collection::vec(any::<i32>(), 0..32)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (tx, mut stream) = channel(4);
            let produced = values.clone();
            tokio::spawn(async move {
                for v in produced {
                    tx.partial(v).await;
                }
            });

            let mut observed = Vec::new();
            while let Some(result) = stream.next().await {
                observed.push(result.into_result().unwrap());
            }
            assert_eq!(observed, values);
        });
    }

    // 2. drain() discards any number of partials and returns the terminal
    //    value that follows them.
    #[test]
    fn drain_returns_terminal_after_partials(
        partials in proptest::collection::vec(any::<i32>(), 0..32),
        terminal in any::<i32>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (tx, stream) = channel(4);
            tokio::spawn(async move {
                for v in partials {
                    tx.partial(v).await;
                }
                tx.value(terminal).await;
            });

            assert_eq!(stream.drain().await.unwrap(), terminal);
        });
    }

    // 3. drain() surfaces a terminal error regardless of preceding partials.
    #[test]
    fn drain_surfaces_terminal_error(partials in proptest::collection::vec(any::<i32>(), 0..32)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (tx, stream) = channel(4);
            tokio::spawn(async move {
                for v in partials {
                    tx.partial(v).await;
                }
                tx.error(RillError::Other("terminal".into())).await;
            });

            assert!(stream.drain().await.is_err());
        });
    }

    // 4. ok() is false exactly for errors, and into_result() agrees with it.
    #[test]
    fn result_ok_flag_agrees_with_payload(v in any::<i32>(), partial in any::<bool>()) {
        let result = if partial { StepResult::Partial(v) } else { StepResult::Value(v) };
        assert!(result.ok());
        assert_eq!(result.into_result().unwrap(), v);

        let err = StepResult::<i32>::Error(RillError::Other("e".into()));
        assert!(!err.ok());
        assert!(err.into_result().is_err());
    }
}
