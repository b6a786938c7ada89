//! In-process market data backend with canned responses

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Entitlement, MarketDataApi, UpstreamError};
use crate::request::ApiParams;

/// A call seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub function: String,
    pub params: ApiParams,
    pub entitlement: Option<Entitlement>,
}

/// Mock market data API that replays fixed bodies per function name
#[derive(Debug, Default)]
pub struct MockMarketDataApi {
    responses: HashMap<String, String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockMarketDataApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned body for a function
    pub fn with_response(mut self, function: &str, body: impl Into<String>) -> Self {
        self.responses.insert(function.to_string(), body.into());
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MarketDataApi for MockMarketDataApi {
    async fn query(
        &self,
        function: &str,
        params: &ApiParams,
        entitlement: Option<Entitlement>,
    ) -> Result<String, UpstreamError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                function: function.to_string(),
                params: params.clone(),
                entitlement,
            });
        }
        let body = self.responses.get(function).ok_or_else(|| UpstreamError::Http {
            status: 404,
            message: format!("No mock response configured for function: {}", function),
        })?;
        super::alpha_vantage::check_body(body)?;
        Ok(body.clone())
    }
}
