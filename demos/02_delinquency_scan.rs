/// delinquency scan - missed installments earn a late penalty
use loan_servicing_rs::chrono::{Duration, NaiveDate, TimeZone, Utc};
use loan_servicing_rs::{
    Client, InMemoryLedger, LoanService, LoanTerms, Money, Rate, SafeTimeProvider,
    ServicingConfig, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let mut service = LoanService::new(InMemoryLedger::new(), ServicingConfig::default());

    let borrower = Client::new("Eka", "Janelidze", NaiveDate::from_ymd_opt(1988, 7, 3).unwrap());
    let client_id = service.register_client(borrower)?;

    let terms = LoanTerms::new(
        "Car",
        Money::from_major(10_000),
        Rate::from_percentage(12),
        12,
        time.now().date_naive(),
    );
    let loan = service.apply_for_loan(client_id, terms, &time)?;

    // first installment falls due on feb 10; skip it
    controller.advance(Duration::days(33));
    println!("\nscanning on {}", time.now().format("%Y-%m-%d"));

    let report = service.run_delinquency_scan(&time)?;
    println!(
        "checked {} loans, imposed {} penalties totalling {}",
        report.checked,
        report.penalties.len(),
        report.total_imposed()
    );

    // the next payment settles the penalty before the installment
    let receipt = service.make_payment(loan.id, Money::from_major(1_000), &time)?;
    println!("\npayment of 1000:");
    println!("  to penalties:      {}", receipt.application.to_penalties);
    println!("  to current period: {}", receipt.application.to_current_period);
    println!("  remaining:         {}", receipt.remaining_amount);

    let status = service.loan_status(client_id, loan.id, &time)?;
    println!("\n{}", status.to_json_pretty()?);

    Ok(())
}
