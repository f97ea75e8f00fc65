use rpcprims_protocol::{BatchCall, Exception, IntoMethodPath};
use rpcprims_schema::ParameterValidators;
use serde_json::Value;

/// Builds the calls of a batch, validating each one as it is added.
///
/// Obtained from [`BatchClient::proxy`](crate::BatchClient::proxy).
#[derive(Debug, Clone, Copy)]
pub struct BatchProxy<'a> {
    validators: &'a ParameterValidators,
}

impl<'a> BatchProxy<'a> {
    pub fn new(validators: &'a ParameterValidators) -> Self {
        Self { validators }
    }

    /// Describe one call. Fails with the validator's own error if the
    /// arguments are rejected.
    pub fn call(
        &self,
        method: impl IntoMethodPath,
        params: Vec<Value>,
    ) -> Result<BatchCall, Exception> {
        let method = method.into_method_path()?;
        self.validators.validate(&method, &params)?;
        Ok(BatchCall::new(method, params))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builds_validated_calls() {
        let validators = ParameterValidators::new().namespace(
            "ns",
            ParameterValidators::new().with("positive", |params: &[Value]| {
                match params.first().and_then(Value::as_i64) {
                    Some(n) if n > 0 => Ok(()),
                    _ => Err(Exception::msg("expected a positive number")),
                }
            }),
        );
        let proxy = BatchProxy::new(&validators);

        let call = proxy.call("ns.positive", vec![json!(3)]).unwrap();
        assert_eq!(call.method.to_string(), "ns.positive");
        assert_eq!(call.params, [json!(3)]);

        let err = proxy.call("ns.positive", vec![json!(-1)]).unwrap_err();
        assert_eq!(err.message(), "expected a positive number");

        assert!(proxy.call("ns.other", vec![json!(-1)]).is_ok());
    }
}
