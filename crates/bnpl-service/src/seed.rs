//! Demo data.

use chrono::NaiveDate;

use bnpl_core::{BnplError, NewUser, Result};
use bnpl_engine::Ledger;

fn demo_user(
    id: &str,
    name: &str,
    phone: &str,
    passport: &str,
    born: (i32, u32, u32),
    card: &str,
) -> Result<NewUser> {
    let (year, month, day) = born;
    Ok(NewUser {
        user_id: id.parse()?,
        full_name: name.into(),
        phone_number: phone.into(),
        passport_number: passport.into(),
        date_of_birth: NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| BnplError::Validation(format!("invalid birth date for {id}")))?,
        card_number: Some(card.into()),
    })
}

/// The users registered by `SEED_DEMO_USERS=true`.
///
/// # Errors
///
/// Never fails for the built-in data; the signature follows the parsers.
pub fn demo_users() -> Result<Vec<NewUser>> {
    Ok(vec![
        demo_user(
            "mock-usr-001",
            "John Doe",
            "+998901234567",
            "AA1234567",
            (1990, 5, 20),
            "4111111111111111",
        )?,
        demo_user(
            "mock-usr-002",
            "Jane Smith",
            "+998901234568",
            "AA1234568",
            (1985, 8, 15),
            "5555555555554444",
        )?,
        demo_user(
            "mock-usr-003",
            "Bob Johnson",
            "+998901234569",
            "AA1234569",
            (1992, 3, 10),
            "378282246310005",
        )?,
    ])
}

/// Register every demo user that is not registered yet.
///
/// Returns how many users were created; running it again creates none.
///
/// # Errors
///
/// Returns `Storage` on store failure.
pub fn seed_demo_users(ledger: &Ledger) -> Result<usize> {
    let mut created = 0;
    for user in demo_users()? {
        match ledger.get_user(&user.user_id) {
            Ok(_) => continue,
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        let user = ledger.register_user(user)?;
        tracing::info!(user_id = %user.user_id, "Seeded demo user");
        created += 1;
    }
    Ok(created)
}
