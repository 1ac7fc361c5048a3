//! Demo data loaded at startup

use chrono::{DateTime, NaiveDate, Utc};
use types::{
    CurrencyTable, Notification, NotificationType, PaymentRequest, Transaction, TransactionStatus,
    TransactionType, User, UserRole,
};

fn at(date: (i32, u32, u32), time: (u32, u32, u32)) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(date.0, date.1, date.2)
        .and_then(|d| d.and_hms_opt(time.0, time.1, time.2))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

pub fn users() -> Vec<User> {
    vec![
        User {
            id: "user_001".to_string(),
            email: "alice.smith@university.edu".to_string(),
            role: UserRole::Student,
            name: "Alice Smith".to_string(),
            student_id: Some("STU2024001".to_string()),
            wallet_address: Some("0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string()),
            created_at: at((2024, 1, 15), (8, 0, 0)),
            is_verified: true,
            two_factor_enabled: true,
        },
        User {
            id: "admin_001".to_string(),
            email: "admin@university.edu".to_string(),
            role: UserRole::Admin,
            name: "Dr. Sarah Johnson".to_string(),
            student_id: None,
            wallet_address: None,
            created_at: at((2023, 8, 1), (8, 0, 0)),
            is_verified: true,
            two_factor_enabled: true,
        },
        User {
            id: "user_002".to_string(),
            email: "bob.wilson@university.edu".to_string(),
            role: UserRole::Student,
            name: "Bob Wilson".to_string(),
            student_id: Some("STU2024002".to_string()),
            wallet_address: Some("0x8f7e6d5c4b3a2d1e0f9a8b7c6d5e4f3a2b1c0d9e".to_string()),
            created_at: at((2024, 1, 10), (9, 30, 0)),
            is_verified: true,
            two_factor_enabled: false,
        },
        User {
            id: "user_003".to_string(),
            email: "emma.davis@university.edu".to_string(),
            role: UserRole::Student,
            name: "Emma Davis".to_string(),
            student_id: Some("STU2024003".to_string()),
            wallet_address: None,
            created_at: at((2024, 1, 8), (14, 15, 0)),
            is_verified: false,
            two_factor_enabled: false,
        },
    ]
}

/// Confirmed ETH transfer with receipt data filled in
#[allow(clippy::too_many_arguments)]
fn confirmed_eth(
    id: &str,
    student: (&str, &str),
    amounts: (f64, f64),
    tx_hash: &str,
    tx_type: TransactionType,
    description: &str,
    block_number: u64,
    confirmations: u32,
    created_at: DateTime<Utc>,
    confirmed_at: DateTime<Utc>,
) -> Option<Transaction> {
    let eth = CurrencyTable::get("ETH")?;
    Some(Transaction {
        id: id.to_string(),
        student_id: student.0.to_string(),
        student_name: student.1.to_string(),
        amount: amounts.0,
        currency: eth.clone(),
        usd_value: amounts.1,
        tx_hash: Some(tx_hash.to_string()),
        status: TransactionStatus::Confirmed,
        tx_type,
        description: description.to_string(),
        gas_used: Some(21_000),
        gas_price: Some(eth.gas_price),
        block_number: Some(block_number),
        confirmations,
        required_confirmations: types::DEFAULT_REQUIRED_CONFIRMATIONS,
        created_at,
        confirmed_at: Some(confirmed_at),
        receipt_hash: None,
        admin_notes: None,
    })
}

pub fn transactions() -> Vec<Transaction> {
    [
        confirmed_eth(
            "tx_001",
            ("STU2024001", "Alice Smith"),
            (2.5, 6000.0),
            "0x8d7e9f2a1c4b5e8a7f9d2c5e8b1a4d7e9f2c5a8b1e4d7f9c2a5e8b1d4f7a9c21",
            TransactionType::Tuition,
            "Spring 2024 Tuition Payment",
            18_954_321,
            12,
            at((2024, 1, 20), (10, 30, 0)),
            at((2024, 1, 20), (10, 35, 0)),
        ),
        confirmed_eth(
            "tx_pending_001",
            ("STU2024002", "John Doe"),
            (1.8, 4320.0),
            "0x9e8f7d6c5b4a3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d87",
            TransactionType::Housing,
            "Dormitory Fee - Fall 2024",
            18_954_322,
            6,
            at((2024, 1, 21), (16, 45, 0)),
            at((2024, 1, 21), (16, 50, 0)),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn payment_requests() -> Vec<PaymentRequest> {
    vec![PaymentRequest {
        student_id: "STU2024001".to_string(),
        amount: 7500.0,
        currency: "USD".to_string(),
        tx_type: TransactionType::Tuition,
        description: "Spring 2024 Tuition Fee".to_string(),
        due_date: at((2024, 3, 1), (23, 59, 59)),
    }]
}

pub fn notifications() -> Vec<Notification> {
    let entries = [
        (
            "notif_001",
            "Payment Confirmed",
            "Alice Smith's tuition payment of 2.5 ETH has been confirmed on the blockchain.",
            NotificationType::Success,
            false,
            at((2024, 1, 22), (10, 35, 0)),
            Some(("user_001", "Alice Smith")),
        ),
        (
            "notif_002",
            "New User Registration",
            "John Doe has registered as a new student and requires verification.",
            NotificationType::Info,
            false,
            at((2024, 1, 22), (9, 20, 0)),
            Some(("user_002", "John Doe")),
        ),
        (
            "notif_003",
            "Transaction Failed",
            "Payment attempt by Emma Davis failed due to insufficient gas fees.",
            NotificationType::Error,
            true,
            at((2024, 1, 22), (8, 15, 0)),
            Some(("user_003", "Emma Davis")),
        ),
        (
            "notif_004",
            "High Gas Fees Alert",
            "Current network gas fees are unusually high. Consider advising users to wait.",
            NotificationType::Warning,
            false,
            at((2024, 1, 22), (7, 45, 0)),
            None,
        ),
        (
            "notif_005",
            "Receipt Uploaded",
            "Alice Smith uploaded a new receipt for transaction tx_001.",
            NotificationType::Info,
            true,
            at((2024, 1, 21), (16, 30, 0)),
            Some(("user_001", "Alice Smith")),
        ),
    ];

    entries
        .into_iter()
        .map(|(id, title, message, kind, read, created_at, owner)| {
            let mut notification = Notification::new(title, message, kind);
            notification.id = id.to_string();
            notification.read = read;
            notification.created_at = created_at;
            match owner {
                Some((user_id, user_name)) => notification.for_user(user_id, user_name),
                None => notification,
            }
        })
        .collect()
}
