//! Tool dispatch for one turn.
//!
//! Called by [`super::session::ToolCallingSession::run()`] once the model has
//! requested tool calls. Calls run sequentially or concurrently; either way
//! the outcomes come back in request order so the session can append them
//! in the order the model issued the calls.

use super::events::{EventHandler, EventResponse, SessionEvent};
use crate::tools::core::ToolSet;
use crate::transcript::{ToolCallRequest, ToolResultContent};
use std::time::Duration;

/// Execute every call of a turn and return the outcomes in request order.
///
/// Each request is executed exactly once, including repeated identical
/// requests. Returns whether a handler asked the run to stop.
pub(crate) async fn dispatch_tool_calls(
    tools: &ToolSet,
    calls: &[ToolCallRequest],
    timeout: Option<Duration>,
    parallel: bool,
    event_handler: &dyn EventHandler,
) -> (Vec<ToolResultContent>, bool) {
    let mut stop_requested = false;
    for call in calls {
        let response = event_handler.on_event(&SessionEvent::ToolExecuting {
            call_id: &call.call_id,
            name: &call.tool_name,
            arguments: &call.raw_arguments,
        });
        stop_requested |= response == Some(EventResponse::Stop);
    }

    let results = if parallel && calls.len() > 1 {
        let futures: Vec<_> = calls
            .iter()
            .map(|call| tools.execute_with_timeout(call, timeout))
            .collect();
        futures::future::join_all(futures).await
    } else {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(tools.execute_with_timeout(call, timeout).await);
        }
        results
    };

    (results, stop_requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolDef;
    use crate::agent::events::NoopHandler;
    use crate::tools::core::{Tool, ToolFuture};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Sleeps for `ms` milliseconds, then records its label.
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Tool for Recorder {
        fn definition(&self) -> ToolDef {
            ToolDef::new(
                "record",
                "Record a label after a delay",
                json!({
                    "type": "object",
                    "properties": {
                        "label": { "type": "string" },
                        "ms": { "type": "integer" }
                    },
                    "required": ["label", "ms"]
                }),
            )
        }

        fn execute(&self, arguments: serde_json::Value) -> ToolFuture<'_> {
            let log = self.log.clone();
            Box::pin(async move {
                let ms = arguments["ms"].as_u64().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                let label = arguments["label"].as_str().unwrap_or_default().to_string();
                log.lock().unwrap().push(label.clone());
                Ok(json!({ "label": label }))
            })
        }
    }

    fn calls() -> Vec<ToolCallRequest> {
        vec![
            ToolCallRequest::new("a", "record", r#"{"label": "slow", "ms": 60}"#),
            ToolCallRequest::new("b", "record", r#"{"label": "fast", "ms": 1}"#),
        ]
    }

    #[tokio::test]
    async fn parallel_results_keep_request_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tools = ToolSet::new().with(Recorder { log: log.clone() });

        let (results, stop) = dispatch_tool_calls(&tools, &calls(), None, true, &NoopHandler).await;
        assert!(!stop);

        // The fast call finished first...
        assert_eq!(*log.lock().unwrap(), vec!["fast", "slow"]);
        // ...but results follow request order.
        assert_eq!(
            results,
            vec![
                ToolResultContent::Output(r#"{"label":"slow"}"#.into()),
                ToolResultContent::Output(r#"{"label":"fast"}"#.into()),
            ]
        );
    }

    #[tokio::test]
    async fn sequential_runs_in_request_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tools = ToolSet::new().with(Recorder { log: log.clone() });

        let (results, _) = dispatch_tool_calls(&tools, &calls(), None, false, &NoopHandler).await;
        assert_eq!(*log.lock().unwrap(), vec!["slow", "fast"]);
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn handler_can_request_stop() {
        let tools = ToolSet::new();
        let handler = crate::agent::events::FnEventHandler::new(|event| match event {
            SessionEvent::ToolExecuting { name: "danger", .. } => Some(EventResponse::Stop),
            _ => None,
        });
        let calls = vec![ToolCallRequest::new("x", "danger", "{}")];
        let (results, stop) = dispatch_tool_calls(&tools, &calls, None, false, &handler).await;
        assert!(stop);
        // Unknown tool still yields a result for the call.
        assert!(results[0].is_error());
    }
}
