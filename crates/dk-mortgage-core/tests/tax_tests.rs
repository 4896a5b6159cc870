use dk_mortgage_core::loan::{compute_loan, LoanParams};
use dk_mortgage_core::rates::{LoanType, RateSheet};
use dk_mortgage_core::tax::deduction::{calculate_rentefradrag, DeductionInput};
use dk_mortgage_core::tax::{
    analyze_combined, analyze_foreign_property, combined_monthly_picture, compute_rentefradrag,
    CombinedInput, ForeignPropertyParams,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loan() -> LoanParams {
    LoanParams {
        property_value: dec!(5_000_000),
        loan_amount: dec!(2_500_000),
        loan_type: LoanType::F5,
        term_years: 30,
        io_years: 0,
        institution: "Realkredit Danmark".into(),
        bond_kurs: Some(dec!(100)),
        annual_rate: None,
    }
}

fn holiday_flat() -> ForeignPropertyParams {
    ForeignPropertyParams {
        foreign_mortgage_balance: dec!(120_000),
        foreign_mortgage_rate: dec!(0.04),
        annual_gross_income_dkk: dec!(900_000),
        ..ForeignPropertyParams::new(dec!(300_000), dec!(1_500), dec!(300))
    }
}

// ===========================================================================
// Rentefradrag
// ===========================================================================

#[test]
fn test_rentefradrag_tiers() {
    let rules = RateSheet::default().interest_deduction;
    assert_eq!(compute_rentefradrag(dec!(40_000), &rules), dec!(13_200));
    assert_eq!(compute_rentefradrag(dec!(50_000), &rules), dec!(16_500));
    assert_eq!(compute_rentefradrag(dec!(100_000), &rules), dec!(29_000));
}

#[test]
fn test_deduction_envelope() {
    let rules = RateSheet::default().interest_deduction;
    let out = calculate_rentefradrag(&DeductionInput { annual_interest: dec!(100_000) }, &rules).unwrap();
    assert_eq!(out.result.tax_saving, dec!(29_000));
    assert_eq!(out.result.effective_rate, dec!(0.29));
    assert_eq!(out.assumptions["threshold"], "50000");
}

#[test]
fn test_first_year_deduction_uses_bond_interest_only() {
    let rates = RateSheet::default();
    let (r, _) = compute_loan(&loan(), &rates).unwrap();
    let year1 = &r.yearly[0];
    let interest: Decimal = r.schedule[..12].iter().map(|row| row.bond_interest).sum();
    assert_eq!(year1.bond_interest, interest);
    assert_eq!(year1.rentefradrag, compute_rentefradrag(interest, &rates.interest_deduction));
}

// ===========================================================================
// Foreign property
// ===========================================================================

#[test]
fn test_foreign_property_pl() {
    let out = analyze_foreign_property(&holiday_flat()).unwrap();
    let r = &out.result;
    // 120k * 4% / 12
    assert_eq!(r.foreign_mortgage_interest_foreign, dec!(400));
    assert_eq!(r.taxable_base_foreign, dec!(800));
    assert_eq!(r.foreign_tax_monthly_foreign, dec!(168));
    assert_eq!(r.net_monthly_foreign, dec!(632));
    // 800 * 7.46 * 0.21
    assert_eq!(r.dk_topup_tax_monthly_dkk, dec!(1253.28));
    assert_eq!(r.net_monthly_dkk, dec!(3461.44));
}

#[test]
fn test_foreign_property_debt_ceiling() {
    let r = analyze_foreign_property(&holiday_flat()).unwrap().result;
    assert_eq!(r.max_total_debt_dkk, dec!(3_150_000));
    assert_eq!(r.foreign_mortgage_dkk, dec!(895_200));
    assert_eq!(r.available_dk_debt_dkk, dec!(2_254_800));
}

// ===========================================================================
// Combined picture
// ===========================================================================

#[test]
fn test_combined_picture() {
    let input = CombinedInput {
        loan: loan(),
        foreign_property: Some(holiday_flat()),
        month: 13,
    };
    let out = analyze_combined(&input, &RateSheet::default()).unwrap();
    let r = &out.result;
    assert_eq!(r.month, 13);
    assert_eq!(r.foreign_income_dkk, dec!(3461.44));
    assert_eq!(r.dk_net_cost, r.dk_gross_cost - r.rentefradrag_saving);
    assert_eq!(r.combined_net, r.dk_net_cost - dec!(3461.44));
    // 2,254,800 - 2,500,000
    assert_eq!(r.debt_headroom, Some(dec!(-245_200)));
    assert!(out.warnings.iter().any(|w| w.contains("debt-ceiling")));
}

#[test]
fn test_combined_without_foreign_property() {
    let rates = RateSheet::default();
    let (r, _) = compute_loan(&loan(), &rates).unwrap();
    let picture = combined_monthly_picture(&r, None, 1, &rates.interest_deduction);
    assert_eq!(picture.combined_net, picture.dk_net_cost);
    assert_eq!(picture.dk_topup_tax, Decimal::ZERO);
}
