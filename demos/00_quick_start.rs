/// quick start - minimal example to get started
use loan_servicing_rs::{Loan, LoanStatus, LoanStatusView, Money, Rate, SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);

    // a $10,000 loan at 12% over a year
    let mut loan = Loan::builder()
        .name("Quick start")
        .amount(Money::from_major(10_000))
        .rate(Rate::from_percentage(12))
        .duration_in_months(12)
        .start_date(time.now().date_naive())
        .build()?;

    // approve and build the installment plan
    loan.decide(true, &time)?;
    loan.generate_payment_schedules()?;
    assert_eq!(loan.status, LoanStatus::Approved);

    println!("monthly payment: {}", loan.calculate_monthly_payment()?);

    // make a payment
    loan.make_payment(Money::from_major(500), &time)?;

    // print current state
    println!("{}", LoanStatusView::from_loan(&loan, &time).to_json_pretty()?);

    Ok(())
}
