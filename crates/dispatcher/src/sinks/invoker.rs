//! LambdaInvoker - asynchronous function invocation through the AWS SDK

use aws_config::SdkConfig;
use aws_sdk_lambda::config::Region;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client;
use bytes::Bytes;
use contracts::{ContractError, InvocationConfig, InvokeResult, Invoker};
use tracing::{debug, instrument};

/// Invoker queueing one `Event` invocation of `function` per batch
#[derive(Debug, Clone)]
pub struct LambdaInvoker {
    client: Client,
    function: String,
}

impl LambdaInvoker {
    pub fn new(client: Client, function: impl Into<String>) -> Self {
        Self {
            client,
            function: function.into(),
        }
    }

    /// Client for `config.region`, sent to `config.endpoint` when set
    pub fn from_sdk_config(sdk: &SdkConfig, config: &InvocationConfig) -> Self {
        let mut builder = aws_sdk_lambda::config::Builder::from(sdk)
            .region(Region::new(config.region.clone()));
        builder.set_endpoint_url(config.endpoint.clone());
        let lambda = builder.build();
        Self::new(Client::from_conf(lambda), &config.function)
    }
}

impl Invoker for LambdaInvoker {
    fn name(&self) -> &str {
        &self.function
    }

    #[instrument(
        name = "lambda_invoker_invoke",
        skip(self, payload),
        fields(function = %self.function, bytes = payload.len())
    )]
    async fn invoke(&self, payload: Bytes) -> Result<InvokeResult, ContractError> {
        let output = self
            .client
            .invoke()
            .function_name(&self.function)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload.to_vec()))
            .send()
            .await
            .map_err(|e| ContractError::invoke(&self.function, DisplayErrorContext(&e).to_string()))?;

        if let Some(function_error) = output.function_error() {
            return Err(ContractError::invoke(
                &self.function,
                format!("function error: {function_error}"),
            ));
        }

        let status = u16::try_from(output.status_code()).unwrap_or_default();
        let body = output
            .payload()
            .map(|blob| String::from_utf8_lossy(blob.as_ref()).into_owned())
            .unwrap_or_default();

        debug!(status, "Invocation accepted");
        Ok(InvokeResult { status, body })
    }
}
