use ae_toolkit_core::murabahah::{calculate_murabahah, MurabahahPlan};
use ae_toolkit_core::ToolkitError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_reference_plan() {
    // 100,000 SAR over 3 months at 2.5% per month with a 1.5% admin fee
    let out = calculate_murabahah(&MurabahahPlan::default()).unwrap();
    let r = &out.result;

    assert_eq!(r.admin_fee_amount, dec!(1_500));
    assert_eq!(r.total_profit, dec!(7_500));
    assert_eq!(r.total_earnings, dec!(9_000));
    assert_eq!(r.base_repayment_per_month.round_dp(2), dec!(35_833.33));
    assert_eq!(r.first_month_payment.round_dp(2), dec!(37_333.33));
    assert_eq!(r.schedule.len(), 3);
}

#[test]
fn test_principal_sums_to_deal_size_for_every_period() {
    for months in 1..=12 {
        let plan = MurabahahPlan {
            deal_size: dec!(1_234_567.89),
            monthly_profit_rate_pct: dec!(3.75),
            financing_period_months: months,
            admin_fee_pct: dec!(2),
        };
        let out = calculate_murabahah(&plan).unwrap();
        let principal: Decimal = out.result.schedule.iter().map(|r| r.principal).sum();
        assert_eq!(principal, plan.deal_size, "period {months}");
        let last = out.result.schedule.last().unwrap();
        assert_eq!(last.remaining_principal, Decimal::ZERO, "period {months}");
    }
}

#[test]
fn test_admin_fee_only_in_first_month() {
    let plan = MurabahahPlan {
        financing_period_months: 6,
        ..MurabahahPlan::default()
    };
    let out = calculate_murabahah(&plan).unwrap();
    let fees: Vec<Decimal> = out.result.schedule.iter().map(|r| r.admin_fee_paid).collect();
    assert_eq!(fees[0], dec!(1_500));
    assert!(fees[1..].iter().all(|f| f.is_zero()));
    assert_eq!(out.result.total_admin_fee, dec!(1_500));
}

#[test]
fn test_zero_admin_fee_allowed() {
    let plan = MurabahahPlan {
        admin_fee_pct: Decimal::ZERO,
        ..MurabahahPlan::default()
    };
    let out = calculate_murabahah(&plan).unwrap();
    assert_eq!(out.result.first_month_payment, out.result.subsequent_monthly_payment);
}

#[test]
fn test_rate_out_of_range() {
    let plan = MurabahahPlan {
        monthly_profit_rate_pct: dec!(0.5),
        ..MurabahahPlan::default()
    };
    match calculate_murabahah(&plan).unwrap_err() {
        ToolkitError::Validation { violations } => {
            assert_eq!(violations.len(), 1);
            assert!(violations[0].starts_with("Monthly profit rate"));
        }
        other => panic!("Expected Validation, got {other:?}"),
    }
}
