use accounts_helper_core::{
    decimal_to_minor_units, minor_units_to_decimal, AccountingPeriod, Category, Currency,
    DebitCredit, Payer, ReconcilableAccount, Reconciliation, TaxonomyError, TransactionRecord,
};
use accounts_helper_import::{
    reapply_mappings_to_unknown_transactions, CategoryMapping, CategoryMatcher, ReapplyOutcome,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error("Invalid value in column {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
    #[error("Amount does not fit in minor units: {0}")]
    AmountOutOfRange(Decimal),
    #[error("Amount has more precision than whole minor units: {0}")]
    FractionalMinorUnits(Decimal),
}

/// Narrows a transaction query. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub account: Option<ReconcilableAccount>,
    pub category: Option<Category>,
    pub period: Option<AccountingPeriod>,
}

impl TransactionFilter {
    pub fn for_period(account: ReconcilableAccount, period: AccountingPeriod) -> Self {
        TransactionFilter {
            account: Some(account),
            category: None,
            period: Some(period),
        }
    }
}

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            transaction_date TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            currency INTEGER NOT NULL,
            exchange_rate TEXT NOT NULL,
            commission_cents INTEGER NOT NULL DEFAULT 0,
            category INTEGER NOT NULL,
            split_amount_cents INTEGER NOT NULL DEFAULT 0,
            split_category INTEGER NOT NULL DEFAULT 0,
            split_remainder_category INTEGER,
            account INTEGER NOT NULL,
            payer INTEGER NOT NULL,
            payee TEXT NOT NULL,
            debit_credit INTEGER NOT NULL,
            explanation TEXT,
            reference TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_account_date ON transactions (account, transaction_date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_mappings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            normalized_key TEXT NOT NULL,
            category INTEGER NOT NULL,
            usage_count INTEGER NOT NULL DEFAULT 1,
            UNIQUE (normalized_key, category)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reconciliations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            previous_ending_balance_cents INTEGER NOT NULL,
            statement_date TEXT,
            statement_ending_balance_cents INTEGER NOT NULL,
            is_closed INTEGER NOT NULL DEFAULT 0,
            UNIQUE (account, year, month)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── Transactions ──────────────────────────────────────────────────────────────

fn to_cents(value: Decimal) -> Result<i64, StorageError> {
    if value.round_dp(2) != value {
        return Err(StorageError::FractionalMinorUnits(value));
    }
    decimal_to_minor_units(value).ok_or(StorageError::AmountOutOfRange(value))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Inserts the record, or replaces the stored copy with the same id.
///
/// Amounts are stored as whole minor units. A record carrying a finer
/// amount, commission or split (e.g. 12.345) is rejected with
/// [`StorageError::FractionalMinorUnits`] rather than silently rounded.
pub async fn save_transaction(pool: &DbPool, tx: &TransactionRecord) -> Result<(), StorageError> {
    let mut conn = pool.acquire().await?;
    upsert_transaction(&mut conn, tx).await
}

/// Saves `tx` together with the mapping that categorised it, in one database
/// transaction. Neither is written if either fails.
pub async fn save_transaction_with_mapping(
    pool: &DbPool,
    tx: &TransactionRecord,
    used_mapping: Option<&CategoryMapping>,
) -> Result<(), StorageError> {
    let mut db_tx = pool.begin().await?;
    upsert_transaction(&mut db_tx, tx).await?;
    if let Some(mapping) = used_mapping {
        upsert_mapping(&mut db_tx, mapping).await?;
    }
    db_tx.commit().await?;
    Ok(())
}

async fn upsert_transaction(
    conn: &mut SqliteConnection,
    tx: &TransactionRecord,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, transaction_date, amount_cents, currency, exchange_rate, commission_cents,
            category, split_amount_cents, split_category, split_remainder_category,
            account, payer, payee, debit_credit, explanation, reference
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            transaction_date = excluded.transaction_date,
            amount_cents = excluded.amount_cents,
            currency = excluded.currency,
            exchange_rate = excluded.exchange_rate,
            commission_cents = excluded.commission_cents,
            category = excluded.category,
            split_amount_cents = excluded.split_amount_cents,
            split_category = excluded.split_category,
            split_remainder_category = excluded.split_remainder_category,
            account = excluded.account,
            payer = excluded.payer,
            payee = excluded.payee,
            debit_credit = excluded.debit_credit,
            explanation = excluded.explanation,
            reference = excluded.reference
        "#,
    )
    .bind(tx.id.to_string())
    .bind(format_timestamp(tx.transaction_date))
    .bind(to_cents(tx.amount)?)
    .bind(tx.currency.code())
    .bind(tx.exchange_rate.to_string())
    .bind(to_cents(tx.commission)?)
    .bind(tx.category.code())
    .bind(to_cents(tx.split_amount)?)
    .bind(tx.split_category.code())
    .bind(tx.split_remainder_category.map(Category::code))
    .bind(tx.account.code())
    .bind(tx.payer.code())
    .bind(&tx.payee)
    .bind(tx.debit_credit.code())
    .bind(&tx.explanation)
    .bind(&tx.reference)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "id, transaction_date, amount_cents, currency, exchange_rate, \
     commission_cents, category, split_amount_cents, split_category, split_remainder_category, \
     account, payer, payee, debit_credit, explanation, reference";

fn transaction_from_row(row: &SqliteRow) -> Result<TransactionRecord, StorageError> {
    let id: String = row.try_get("id")?;
    let date: String = row.try_get("transaction_date")?;
    let rate: String = row.try_get("exchange_rate")?;
    let remainder: Option<i32> = row.try_get("split_remainder_category")?;

    Ok(TransactionRecord {
        id: Uuid::parse_str(&id).map_err(|_| StorageError::InvalidValue {
            column: "id",
            value: id.clone(),
        })?,
        transaction_date: DateTime::parse_from_rfc3339(&date)
            .map_err(|_| StorageError::InvalidValue {
                column: "transaction_date",
                value: date.clone(),
            })?
            .with_timezone(&Utc),
        amount: minor_units_to_decimal(row.try_get("amount_cents")?),
        currency: Currency::try_from_code(row.try_get("currency")?)?,
        exchange_rate: Decimal::from_str(&rate).map_err(|_| StorageError::InvalidValue {
            column: "exchange_rate",
            value: rate.clone(),
        })?,
        commission: minor_units_to_decimal(row.try_get("commission_cents")?),
        category: Category::try_from_code(row.try_get("category")?)?,
        split_amount: minor_units_to_decimal(row.try_get("split_amount_cents")?),
        split_category: Category::try_from_code(row.try_get("split_category")?)?,
        split_remainder_category: remainder.map(Category::try_from_code).transpose()?,
        account: ReconcilableAccount::try_from_code(row.try_get("account")?)?,
        payer: Payer::try_from_code(row.try_get("payer")?)?,
        payee: row.try_get("payee")?,
        debit_credit: DebitCredit::try_from_code(row.try_get("debit_credit")?)?,
        explanation: row.try_get("explanation")?,
        reference: row.try_get("reference")?,
    })
}

pub async fn get_transaction(
    pool: &DbPool,
    id: Uuid,
) -> Result<Option<TransactionRecord>, StorageError> {
    let row = sqlx::query(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?"
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(transaction_from_row).transpose()
}

/// Transactions matching `filter`, oldest first.
pub async fn get_transactions(
    pool: &DbPool,
    filter: &TransactionFilter,
) -> Result<Vec<TransactionRecord>, StorageError> {
    let rows = sqlx::query(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions \
         WHERE (?1 IS NULL OR account = ?1) AND (?2 IS NULL OR category = ?2) \
         ORDER BY transaction_date, created_at"
    ))
    .bind(filter.account.map(ReconcilableAccount::code))
    .bind(filter.category.map(Category::code))
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let record = transaction_from_row(row)?;
        let in_period = filter
            .period
            .map_or(true, |p| p.contains(record.transaction_date.date_naive()));
        if in_period {
            records.push(record);
        }
    }
    Ok(records)
}

async fn fetch_uncategorized(
    conn: &mut SqliteConnection,
) -> Result<Vec<TransactionRecord>, StorageError> {
    let rows = sqlx::query(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE category = ? ORDER BY transaction_date"
    ))
    .bind(Category::Unknown.code())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(transaction_from_row).collect()
}

pub async fn get_uncategorized_transactions(
    pool: &DbPool,
) -> Result<Vec<TransactionRecord>, StorageError> {
    let mut conn = pool.acquire().await?;
    fetch_uncategorized(&mut conn).await
}

// ── Category mappings ─────────────────────────────────────────────────────────

async fn fetch_mappings(conn: &mut SqliteConnection) -> Result<Vec<CategoryMapping>, StorageError> {
    let rows = sqlx::query_as::<_, (String, i32, i64)>(
        "SELECT normalized_key, category, usage_count FROM category_mappings ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(normalized_key, category, usage)| {
            Ok(CategoryMapping {
                normalized_key,
                category: Category::try_from_code(category)?,
                usage_count: u32::try_from(usage).map_err(|_| StorageError::InvalidValue {
                    column: "usage_count",
                    value: usage.to_string(),
                })?,
            })
        })
        .collect()
}

pub async fn get_category_mappings(pool: &DbPool) -> Result<Vec<CategoryMapping>, StorageError> {
    let mut conn = pool.acquire().await?;
    fetch_mappings(&mut conn).await
}

async fn upsert_mapping(
    conn: &mut SqliteConnection,
    mapping: &CategoryMapping,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO category_mappings (normalized_key, category, usage_count) VALUES (?, ?, ?)
        ON CONFLICT(normalized_key, category) DO UPDATE SET usage_count = excluded.usage_count
        "#,
    )
    .bind(&mapping.normalized_key)
    .bind(mapping.category.code())
    .bind(i64::from(mapping.usage_count))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Stores `mapping`, keyed on (normalized key, category).
pub async fn save_category_mapping(
    pool: &DbPool,
    mapping: &CategoryMapping,
) -> Result<(), StorageError> {
    let mut conn = pool.acquire().await?;
    upsert_mapping(&mut conn, mapping).await?;
    Ok(())
}

/// Teaches `payee` → `category` against the stored mappings.
///
/// Re-teaching a known key moves that row to the new category in place, so
/// the table never grows a second row for the same key through this path.
pub async fn teach_category_mapping(
    pool: &DbPool,
    payee: &str,
    category: Category,
    seed_usage: u32,
) -> Result<Option<CategoryMapping>, StorageError> {
    let mut tx = pool.begin().await?;
    let mut matcher = CategoryMatcher::new(fetch_mappings(&mut tx).await?).with_seed_usage(seed_usage);

    let Some(taught) = matcher.teach_mapping(payee, category) else {
        return Ok(None);
    };

    // Prefer the exact pair, then any row for the key, as the matcher does.
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM category_mappings WHERE normalized_key = ? \
         ORDER BY (category = ?) DESC, id LIMIT 1",
    )
    .bind(&taught.normalized_key)
    .bind(category.code())
    .fetch_optional(&mut *tx)
    .await?;

    match existing {
        Some(id) => {
            sqlx::query("UPDATE category_mappings SET category = ?, usage_count = ? WHERE id = ?")
                .bind(taught.category.code())
                .bind(i64::from(taught.usage_count))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        None => upsert_mapping(&mut tx, &taught).await?,
    }

    tx.commit().await?;
    tracing::info!(
        key = %taught.normalized_key,
        category = %taught.category,
        usage = taught.usage_count,
        "Category mapping taught"
    );
    Ok(Some(taught))
}

/// Categorises every stored uncategorised transaction whose payee now
/// matches a learned mapping.
///
/// All writes happen in one database transaction; on any failure nothing is
/// committed and the caller may simply retry.
pub async fn reapply_learned_mappings(pool: &DbPool) -> Result<ReapplyOutcome, StorageError> {
    let mut tx = pool.begin().await?;

    let mut matcher = CategoryMatcher::new(fetch_mappings(&mut tx).await?);
    let mut records = fetch_uncategorized(&mut tx).await?;
    let outcome = reapply_mappings_to_unknown_transactions(&mut matcher, &mut records);

    for change in &outcome.changes {
        sqlx::query("UPDATE transactions SET category = ? WHERE id = ? AND category = ?")
            .bind(change.category.code())
            .bind(change.transaction_id.to_string())
            .bind(Category::Unknown.code())
            .execute(&mut *tx)
            .await?;
    }
    for mapping in &outcome.used_mappings {
        upsert_mapping(&mut tx, mapping).await?;
    }

    tx.commit().await?;
    tracing::info!(
        scanned = records.len(),
        categorised = outcome.changes.len(),
        "Reapplied learned category mappings"
    );
    Ok(outcome)
}

// ── Reconciliations ───────────────────────────────────────────────────────────

pub async fn save_reconciliation(pool: &DbPool, rec: &Reconciliation) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO reconciliations (
            account, year, month, previous_ending_balance_cents, statement_date,
            statement_ending_balance_cents, is_closed
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(account, year, month) DO UPDATE SET
            previous_ending_balance_cents = excluded.previous_ending_balance_cents,
            statement_date = excluded.statement_date,
            statement_ending_balance_cents = excluded.statement_ending_balance_cents,
            is_closed = excluded.is_closed
        "#,
    )
    .bind(rec.account.code())
    .bind(rec.period.year)
    .bind(rec.period.month)
    .bind(to_cents(rec.previous_ending_balance)?)
    .bind(rec.statement_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(to_cents(rec.statement_ending_balance)?)
    .bind(rec.closed)
    .execute(pool)
    .await?;

    Ok(())
}

fn reconciliation_from_row(row: &SqliteRow) -> Result<Reconciliation, StorageError> {
    let year: i32 = row.try_get("year")?;
    let month: u32 = row.try_get("month")?;
    let statement_date: Option<String> = row.try_get("statement_date")?;

    Ok(Reconciliation {
        account: ReconcilableAccount::try_from_code(row.try_get("account")?)?,
        period: AccountingPeriod::new(year, month).ok_or(StorageError::InvalidValue {
            column: "month",
            value: month.to_string(),
        })?,
        previous_ending_balance: minor_units_to_decimal(
            row.try_get("previous_ending_balance_cents")?,
        ),
        statement_date: statement_date
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| StorageError::InvalidValue {
                    column: "statement_date",
                    value: s.clone(),
                })
            })
            .transpose()?,
        statement_ending_balance: minor_units_to_decimal(
            row.try_get("statement_ending_balance_cents")?,
        ),
        closed: row.try_get("is_closed")?,
    })
}

const RECONCILIATION_COLUMNS: &str = "account, year, month, previous_ending_balance_cents, \
     statement_date, statement_ending_balance_cents, is_closed";

pub async fn get_reconciliation(
    pool: &DbPool,
    account: ReconcilableAccount,
    period: AccountingPeriod,
) -> Result<Option<Reconciliation>, StorageError> {
    let row = sqlx::query(&format!(
        "SELECT {RECONCILIATION_COLUMNS} FROM reconciliations WHERE account = ? AND year = ? AND month = ?"
    ))
    .bind(account.code())
    .bind(period.year)
    .bind(period.month)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(reconciliation_from_row).transpose()
}

/// Every stored period for `account`, opening balances first.
pub async fn get_reconciliations(
    pool: &DbPool,
    account: ReconcilableAccount,
) -> Result<Vec<Reconciliation>, StorageError> {
    let rows = sqlx::query(&format!(
        "SELECT {RECONCILIATION_COLUMNS} FROM reconciliations WHERE account = ? ORDER BY year, month"
    ))
    .bind(account.code())
    .fetch_all(pool)
    .await?;

    rows.iter().map(reconciliation_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    async fn test_db() -> (TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("ledger.db")).await.unwrap();
        (dir, pool)
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn record(day: u32, amount: &str, payee: &str, category: Category) -> TransactionRecord {
        TransactionRecord::new(
            Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            d(amount),
            Currency::Gbp,
            ReconcilableAccount::CurrentAccountGbp,
            payee,
        )
        .with_category(category)
        .with_payer(Payer::Primary)
    }

    #[tokio::test]
    async fn transaction_round_trips_through_minor_units() {
        let (_dir, pool) = test_db().await;
        let mut tx = record(5, "-12.34", "Refund Ltd", Category::Refund)
            .with_split(d("-2.00"), Category::Fees)
            .with_commission(d("0.50"));
        tx.set_currency(Currency::Usd);
        tx.exchange_rate = d("0.7891");
        tx.split_remainder_category = Some(Category::Shopping);
        tx.explanation = Some("partial".to_string());
        save_transaction(&pool, &tx).await.unwrap();

        let loaded = get_transaction(&pool, tx.id).await.unwrap().unwrap();
        assert_eq!(loaded, tx);
    }

    #[tokio::test]
    async fn save_transaction_replaces_by_id() {
        let (_dir, pool) = test_db().await;
        let mut tx = record(5, "10", "Tesco", Category::Unknown);
        save_transaction(&pool, &tx).await.unwrap();
        tx.category = Category::Groceries;
        save_transaction(&pool, &tx).await.unwrap();

        let all = get_transactions(&pool, &TransactionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, Category::Groceries);
    }

    #[tokio::test]
    async fn sub_cent_amounts_are_rejected() {
        let (_dir, pool) = test_db().await;
        let mut tx = record(5, "12.345", "Diner", Category::DiningOut);
        tx.set_currency(Currency::Usd);
        tx.exchange_rate = d("0.79");
        let err = save_transaction(&pool, &tx).await.unwrap_err();
        assert!(matches!(err, StorageError::FractionalMinorUnits(v) if v == d("12.345")));
        assert!(get_transaction(&pool, tx.id).await.unwrap().is_none());

        let trailing_zeros = record(6, "12.3400", "Diner", Category::DiningOut);
        save_transaction(&pool, &trailing_zeros).await.unwrap();
        let loaded = get_transaction(&pool, trailing_zeros.id).await.unwrap().unwrap();
        assert_eq!(loaded.amount, d("12.34"));
    }

    #[tokio::test]
    async fn transaction_and_mapping_commit_together() {
        let (_dir, pool) = test_db().await;
        let mapping = CategoryMapping {
            normalized_key: "tesco".to_string(),
            category: Category::Groceries,
            usage_count: 4,
        };
        let good = record(5, "10", "Tesco", Category::Groceries);
        save_transaction_with_mapping(&pool, &good, Some(&mapping)).await.unwrap();
        assert_eq!(get_category_mappings(&pool).await.unwrap(), vec![mapping.clone()]);
        assert!(get_transaction(&pool, good.id).await.unwrap().is_some());

        let bumped = CategoryMapping {
            usage_count: 5,
            ..mapping.clone()
        };
        let bad = record(6, "0.001", "Tesco", Category::Groceries);
        assert!(save_transaction_with_mapping(&pool, &bad, Some(&bumped)).await.is_err());
        assert_eq!(get_category_mappings(&pool).await.unwrap(), vec![mapping]);
        assert!(get_transaction(&pool, bad.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn filter_by_account_and_period() {
        let (_dir, pool) = test_db().await;
        save_transaction(&pool, &record(1, "10", "a", Category::Groceries)).await.unwrap();
        save_transaction(&pool, &record(31, "20", "b", Category::Groceries)).await.unwrap();
        let mut amex = record(2, "30", "c", Category::Groceries);
        amex.account = ReconcilableAccount::AmexGbp;
        save_transaction(&pool, &amex).await.unwrap();
        let mut april = record(2, "40", "d", Category::Groceries);
        april.transaction_date = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        save_transaction(&pool, &april).await.unwrap();

        let filter = TransactionFilter::for_period(
            ReconcilableAccount::CurrentAccountGbp,
            AccountingPeriod::new(2024, 3).unwrap(),
        );
        let found = get_transactions(&pool, &filter).await.unwrap();
        let payees: Vec<&str> = found.iter().map(|t| t.payee.as_str()).collect();
        assert_eq!(payees, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn teach_updates_key_in_place() {
        let (_dir, pool) = test_db().await;
        teach_category_mapping(&pool, "Amazon", Category::Shopping, 1).await.unwrap();
        let taught = teach_category_mapping(&pool, "AMAZON ", Category::Subscriptions, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(taught.usage_count, 2);

        let mappings = get_category_mappings(&pool).await.unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].category, Category::Subscriptions);
        assert_eq!(mappings[0].normalized_key, "amazon");
    }

    #[tokio::test]
    async fn teach_blank_payee_stores_nothing() {
        let (_dir, pool) = test_db().await;
        assert!(teach_category_mapping(&pool, "  ", Category::Other, 1).await.unwrap().is_none());
        assert!(get_category_mappings(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_mapping_upserts_usage() {
        let (_dir, pool) = test_db().await;
        let mut mapping = CategoryMapping {
            normalized_key: "tfl".to_string(),
            category: Category::Transport,
            usage_count: 1,
        };
        save_category_mapping(&pool, &mapping).await.unwrap();
        mapping.usage_count = 7;
        save_category_mapping(&pool, &mapping).await.unwrap();
        assert_eq!(get_category_mappings(&pool).await.unwrap(), vec![mapping]);
    }

    #[tokio::test]
    async fn reapply_categorises_and_is_idempotent() {
        let (_dir, pool) = test_db().await;
        teach_category_mapping(&pool, "tesco", Category::Groceries, 1).await.unwrap();
        let unknown = record(3, "5", "TESCO METRO", Category::Unknown);
        let known = record(4, "6", "Tesco", Category::Gifts);
        let unmatched = record(5, "7", "Corner shop", Category::Unknown);
        for tx in [&unknown, &known, &unmatched] {
            save_transaction(&pool, tx).await.unwrap();
        }

        let first = reapply_learned_mappings(&pool).await.unwrap();
        assert_eq!(first.changes.len(), 1);
        assert_eq!(first.changes[0].transaction_id, unknown.id);

        let second = reapply_learned_mappings(&pool).await.unwrap();
        assert!(second.changes.is_empty());

        let reloaded = get_transaction(&pool, unknown.id).await.unwrap().unwrap();
        assert_eq!(reloaded.category, Category::Groceries);
        let untouched = get_transaction(&pool, known.id).await.unwrap().unwrap();
        assert_eq!(untouched.category, Category::Gifts);
        assert_eq!(get_uncategorized_transactions(&pool).await.unwrap().len(), 1);

        let mappings = get_category_mappings(&pool).await.unwrap();
        assert_eq!(mappings[0].usage_count, 2);
    }

    #[tokio::test]
    async fn reconciliation_round_trip_and_ordering() {
        let (_dir, pool) = test_db().await;
        let account = ReconcilableAccount::CurrentAccountGbp;
        let march = Reconciliation::new(account, AccountingPeriod::new(2024, 3).unwrap(), d("100"))
            .with_statement(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), d("120.55"));
        let opening = Reconciliation::new(account, AccountingPeriod::opening_balances(), d("100"));
        save_reconciliation(&pool, &march).await.unwrap();
        save_reconciliation(&pool, &opening).await.unwrap();

        let mut closed = march.clone();
        closed.closed = true;
        save_reconciliation(&pool, &closed).await.unwrap();

        let loaded = get_reconciliation(&pool, account, march.period).await.unwrap().unwrap();
        assert_eq!(loaded, closed);

        let all = get_reconciliations(&pool, account).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].period.is_opening_balances());
        assert!(get_reconciliations(&pool, ReconcilableAccount::AmexGbp)
            .await
            .unwrap()
            .is_empty());
    }
}
