//! Parameters for opening the gateway's hosted checkout widget.
//!
//! The widget itself runs in the browser; this module only assembles the
//! values it must be configured with so that the invoice, amounts and billing
//! data always match the stored order.

use crate::{config::AppConfig, core::pricing::round2, entities::order};
use serde::Serialize;

/// Values passed to the widget's `configure`/`open` calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutParams {
    pub key: String,
    pub test: bool,
    pub name: String,
    pub description: String,
    /// The order's reference code
    pub invoice: String,
    pub currency: String,
    pub amount: String,
    pub tax_base: String,
    pub tax: String,
    pub country: String,
    pub lang: String,
    pub external: String,
    pub response: String,
    pub confirmation: String,
    pub name_billing: String,
    pub address_billing: String,
    pub type_doc_billing: String,
    pub mobilephone_billing: String,
    pub number_doc_billing: String,
    pub email_billing: String,
}

fn format_amount(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Builds widget parameters for a stored order.
#[must_use]
pub fn checkout_params(config: &AppConfig, order: &order::Model) -> CheckoutParams {
    let payments = &config.payments;
    CheckoutParams {
        key: payments.epayco_public_key.clone(),
        test: payments.epayco_test,
        name: payments.merchant_name.trim().to_string(),
        description: format!("{} {}", payments.merchant_name.trim(), order.reference_code),
        invoice: order.reference_code.clone(),
        currency: order.currency.clone(),
        amount: format_amount(order.amount),
        tax_base: format_amount(order.tax_base),
        tax: format_amount(order.tax),
        country: payments.country.clone(),
        lang: payments.lang.clone(),
        external: payments.epayco_external.to_string(),
        response: config.absolute_url(&payments.response_path),
        confirmation: config.absolute_url(&payments.confirmation_path),
        name_billing: order.buyer_name.trim().to_string(),
        address_billing: order.shipping_address.trim().to_string(),
        type_doc_billing: order.document_type.trim().to_uppercase(),
        mobilephone_billing: order.phone.trim().to_string(),
        number_doc_billing: order.document_number.trim().to_string(),
        email_billing: order.buyer_email.trim().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_order_model;

    #[test]
    fn test_checkout_params_from_order() {
        let mut config = AppConfig::default();
        config.server.public_base_url = "https://tienda.co/".to_string();
        config.payments.epayco_public_key = "pk_test".to_string();

        let mut order = sample_order_model();
        order.buyer_email = "  Ana@Example.CO ".to_string();
        order.document_type = "cc".to_string();

        let params = checkout_params(&config, &order);
        assert_eq!(params.key, "pk_test");
        assert!(params.test);
        assert_eq!(params.invoice, order.reference_code);
        assert_eq!(params.amount, "119.00");
        assert_eq!(params.tax, "19.00");
        assert_eq!(params.tax_base, "100.00");
        assert_eq!(params.currency, "COP");
        assert_eq!(params.external, "false");
        assert_eq!(params.email_billing, "ana@example.co");
        assert_eq!(params.type_doc_billing, "CC");
        assert_eq!(params.response, "https://tienda.co/api/epayco/response");
        assert_eq!(
            params.confirmation,
            "https://tienda.co/api/epayco/confirmation"
        );
    }
}
