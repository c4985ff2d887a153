/// overpayment - extra money shrinks every remaining installment
use loan_servicing_rs::chrono::{TimeZone, Utc};
use loan_servicing_rs::{Loan, Money, Rate, SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    ));

    let mut loan = Loan::builder()
        .name("Renovation")
        .amount(Money::from_major(10_000))
        .rate(Rate::from_percentage(12))
        .duration_in_months(12)
        .start_date(time.now().date_naive())
        .build()?;
    loan.decide(true, &time)?;
    loan.generate_payment_schedules()?;

    println!("=== overpayment ===\n");
    println!("initial installment: {}", loan.payment_schedules[0].amount);

    for amount in [2_000, 1_000] {
        let application = loan.make_payment(Money::from_major(amount), &time)?;
        let next = loan.get_next_month_payment();

        println!("\npaid {}", amount);
        println!("  to current period: {}", application.to_current_period);
        println!("  re-spread:         {}", application.to_future_periods);
        println!("  remaining:         {}", loan.remaining_amount);
        println!("  next installment:  {}", next);
    }

    println!("\nschedule:");
    for schedule in &loan.payment_schedules {
        println!(
            "  {}  {:>10}  paid {:>10}{}",
            schedule.payment_day,
            schedule.amount.to_string(),
            schedule.paid_amount.to_string(),
            if schedule.is_paid { "  ✓" } else { "" }
        );
    }

    // pay off the rest
    let rest = loan.remaining_amount;
    loan.make_payment(rest, &time)?;
    println!("\nafter paying {}: {}", rest, loan.status);

    for event in loan.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
