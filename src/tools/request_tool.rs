//! Generic tool over a validated request type

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::{Tool, ToolContext};
use crate::error::AvError;
use crate::ingest::DEFAULT_MARKER;
use crate::request::{Params, ToolRequest};

/// Exposes a `ToolRequest` type as a tool: validate, route, query, deliver
pub struct RequestTool<R> {
    _request: PhantomData<fn() -> R>,
}

impl<R: ToolRequest> RequestTool<R> {
    pub fn new() -> Self {
        Self { _request: PhantomData }
    }
}

impl<R: ToolRequest> Default for RequestTool<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: ToolRequest> Tool for RequestTool<R> {
    fn name(&self) -> &'static str {
        R::TOOL_NAME
    }

    fn description(&self) -> &'static str {
        R::DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        R::input_schema()
    }

    async fn execute(&self, params: &Params, ctx: &ToolContext<'_>) -> Result<String, AvError> {
        let request = R::from_params(params)?;
        let routed = request.route()?;

        log::info!("{} tool={} function={}", DEFAULT_MARKER, R::TOOL_NAME, routed.function);

        let body = ctx
            .api
            .query(routed.function, &routed.params, ctx.entitlement)
            .await?;
        ctx.delivery.deliver(&routed, body, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::forex::ForexRequest;
    use crate::tools::OutputDelivery;
    use crate::upstream::{Entitlement, MockMarketDataApi};
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_execute_routes_and_queries() {
        let api = MockMarketDataApi::new().with_response("FX_DAILY", "timestamp,open\n2024-01-02,1.1");
        let delivery = OutputDelivery::inline_only();
        let ctx = ToolContext {
            api: &api,
            delivery: &delivery,
            entitlement: Some(Entitlement::Delayed),
        };
        let tool = RequestTool::<ForexRequest>::new();

        let body = tool
            .execute(&params(json!({"timeframe": "daily", "from_symbol": "EUR", "to_symbol": "USD"})), &ctx)
            .await
            .unwrap();
        assert!(body.starts_with("timestamp"));

        let calls = api.calls();
        assert_eq!(calls[0].function, "FX_DAILY");
        assert_eq!(calls[0].params.get("outputsize"), Some("compact"));
        assert_eq!(calls[0].entitlement, Some(Entitlement::Delayed));
    }

    #[tokio::test]
    async fn test_execute_validation_failure_skips_upstream() {
        let api = MockMarketDataApi::new();
        let delivery = OutputDelivery::inline_only();
        let ctx = ToolContext {
            api: &api,
            delivery: &delivery,
            entitlement: None,
        };
        let tool = RequestTool::<ForexRequest>::new();

        let err = tool.execute(&params(json!({"timeframe": "daily"})), &ctx).await.unwrap_err();
        assert!(matches!(err, AvError::Validation(_)));
        assert!(api.calls().is_empty());
    }
}
