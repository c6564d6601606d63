//! Curated `us-gaap` metric keys.

use crate::types::MetricKey;

/// Headline income statement, balance sheet and cash flow metrics, in report order.
pub const TOP_METRICS: &[&str] = &[
    "us-gaap_RevenueFromContractWithCustomerExcludingAssessedTax_USD",
    "us-gaap_CostOfGoodsAndServicesSold_USD",
    "us-gaap_ResearchAndDevelopmentExpense_USD",
    "us-gaap_NetIncomeLoss_USD",
    "us-gaap_EarningsPerShareBasic_USD/shares",
    "us-gaap_EarningsPerShareDiluted_USD/shares",
    "us-gaap_OperatingIncomeLoss_USD",
    "us-gaap_GrossProfit_USD",
    "us-gaap_Assets_USD",
    "us-gaap_AssetsCurrent_USD",
    "us-gaap_LiabilitiesCurrent_USD",
    "us-gaap_StockholdersEquity_USD",
    "us-gaap_CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalents_USD",
    "us-gaap_CashAndCashEquivalentsAtCarryingValue_USD",
    "us-gaap_CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalentsPeriodIncreaseDecreaseIncludingExchangeRateEffect_USD",
    "us-gaap_NetCashProvidedByUsedInOperatingActivities_USD",
    "us-gaap_NetCashProvidedByUsedInInvestingActivities_USD",
    "us-gaap_NetCashProvidedByUsedInFinancingActivities_USD",
    "us-gaap_InterestExpense_USD",
    "us-gaap_LongTermDebt_USD",
    "us-gaap_DebtInstrumentCarryingAmount_USD",
    "us-gaap_AllocatedShareBasedCompensationExpense_USD",
    "us-gaap_ShareBasedCompensation_USD",
    "us-gaap_IncomeTaxExpenseBenefit_USD",
    "us-gaap_SellingGeneralAndAdministrativeExpense_USD",
    "us-gaap_InventoryNet_USD",
];

/// Revenue key used by [`monthly_revenue`](crate::table::monthly_revenue).
pub const REVENUE_METRIC: &str = "us-gaap_RevenueFromContractWithCustomerExcludingAssessedTax_USD";

/// Cost of goods key used by [`quarterly_cogs`](crate::table::quarterly_cogs).
pub const COGS_METRIC: &str = "us-gaap_CostOfGoodsAndServicesSold_USD";

/// Returns [`TOP_METRICS`] as owned keys.
#[must_use]
pub fn top_metrics() -> Vec<MetricKey> {
    TOP_METRICS.iter().copied().map(MetricKey::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_top_metrics_are_unique() {
        let unique: HashSet<_> = TOP_METRICS.iter().collect();
        assert_eq!(unique.len(), TOP_METRICS.len());
    }

    #[test]
    fn test_top_metrics_are_single_keys() {
        for key in TOP_METRICS {
            assert!(key.starts_with("us-gaap_"), "{key}");
            assert_eq!(key.matches("us-gaap_").count(), 1, "{key}");
        }
        assert!(TOP_METRICS.contains(&"us-gaap_NetIncomeLoss_USD"));
    }
}
