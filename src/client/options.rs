use crate::utils::constants::{HEADER_INTEGRATOR_CARRIER_ID, HEADER_SHIPMENT_GROUP_ID, HEADER_TRANSACTION_ID};

/// Optional headers for shipment creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentOptions {
    pub integrator_carrier_id: Option<String>,
    pub shipment_group_id: Option<String>,
    pub transaction_id: Option<String>,
}

impl ShipmentOptions {
    pub fn with_integrator_carrier_id(mut self, id: impl Into<String>) -> Self {
        self.integrator_carrier_id = Some(id.into());
        self
    }

    pub fn with_shipment_group_id(mut self, id: impl Into<String>) -> Self {
        self.shipment_group_id = Some(id.into());
        self
    }

    pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    /// Header pairs for the options that are set.
    pub fn headers(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (HEADER_INTEGRATOR_CARRIER_ID, &self.integrator_carrier_id),
            (HEADER_SHIPMENT_GROUP_ID, &self.shipment_group_id),
            (HEADER_TRANSACTION_ID, &self.transaction_id),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
    }
}

#[cfg(test)]
mod test {
    use super::ShipmentOptions;

    #[test]
    fn only_set_options_become_headers() {
        assert_eq!(ShipmentOptions::default().headers().count(), 0);

        let options = ShipmentOptions::default().with_transaction_id("tx-1");
        let headers: Vec<_> = options.headers().collect();
        assert_eq!(headers, vec![("X-PB-TransactionId", "tx-1")]);
    }
}
