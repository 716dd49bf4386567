//! The external banking service contract (§6.2) and an in-memory reference
//! implementation used by the shipped server binary and the e2e tests.
//!
//! `Dispatcher` depends only on `BankingService`; a production deployment
//! can swap in a networked or persistent implementation without touching
//! the dispatcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use types::{Currency, Status};

pub struct OpenAccountResult {
    pub account_no: String,
    pub balance_cents: i64,
}

pub struct CloseAccountResult {
    pub final_balance_cents: i64,
}

pub struct BalanceResult {
    pub new_balance_cents: i64,
}

pub struct QueryBalanceResult {
    pub balance_cents: i64,
    pub currency: Currency,
}

pub struct TransferResult {
    pub new_source_balance_cents: i64,
    pub new_dest_balance_cents: i64,
}

/// A business-logic outcome: success value or one of the `Status` codes in
/// §3 that the dispatcher copies verbatim into the reply.
pub type BankResult<T> = Result<T, Status>;

/// The external collaborator the dispatcher drives. Implementations must be
/// thread-safe and must make `transfer` atomic across both accounts.
pub trait BankingService: Send + Sync {
    fn open_account(
        &self,
        username: &str,
        password: &str,
        currency: Currency,
        initial_balance_cents: i64,
    ) -> BankResult<OpenAccountResult>;

    fn close_account(
        &self,
        username: &str,
        password: &str,
        account_no: &str,
    ) -> BankResult<CloseAccountResult>;

    fn deposit(
        &self,
        username: &str,
        password: &str,
        account_no: &str,
        amount_cents: i64,
    ) -> BankResult<BalanceResult>;

    fn withdraw(
        &self,
        username: &str,
        password: &str,
        account_no: &str,
        amount_cents: i64,
    ) -> BankResult<BalanceResult>;

    fn query_balance(
        &self,
        username: &str,
        password: &str,
        account_no: &str,
    ) -> BankResult<QueryBalanceResult>;

    fn transfer(
        &self,
        username: &str,
        password: &str,
        from_account: &str,
        to_account: &str,
        amount_cents: i64,
    ) -> BankResult<TransferResult>;
}

#[derive(Clone)]
struct Account {
    username: String,
    password: String,
    currency: Currency,
    balance_cents: i64,
}

struct Books {
    accounts: HashMap<String, Account>,
    usernames: HashMap<String, String>,
}

/// In-memory reference implementation of [`BankingService`]. State lives
/// only for the process lifetime — this is a test/demo collaborator, not a
/// persistence layer.
pub struct InMemoryBank {
    books: Mutex<Books>,
    next_account_no: AtomicU64,
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(Books {
                accounts: HashMap::new(),
                usernames: HashMap::new(),
            }),
            next_account_no: AtomicU64::new(1),
        }
    }

    fn new_account_no(&self) -> String {
        let n = self.next_account_no.fetch_add(1, Ordering::Relaxed);
        format!("ACC{n:06}")
    }

    fn authenticate<'a>(
        books: &'a Books,
        username: &str,
        password: &str,
        account_no: &str,
    ) -> Result<&'a Account, Status> {
        let account = books.accounts.get(account_no).ok_or(Status::NotFound)?;
        if account.username != username || account.password != password {
            return Err(Status::AuthFail);
        }
        Ok(account)
    }
}

impl BankingService for InMemoryBank {
    fn open_account(
        &self,
        username: &str,
        password: &str,
        currency: Currency,
        initial_balance_cents: i64,
    ) -> BankResult<OpenAccountResult> {
        let mut books = self.books.lock();
        if books.usernames.contains_key(username) {
            return Err(Status::AlreadyExists);
        }
        let account_no = self.new_account_no();
        books.accounts.insert(
            account_no.clone(),
            Account {
                username: username.to_string(),
                password: password.to_string(),
                currency,
                balance_cents: initial_balance_cents,
            },
        );
        books
            .usernames
            .insert(username.to_string(), account_no.clone());
        Ok(OpenAccountResult {
            account_no,
            balance_cents: initial_balance_cents,
        })
    }

    fn close_account(
        &self,
        username: &str,
        password: &str,
        account_no: &str,
    ) -> BankResult<CloseAccountResult> {
        let mut books = self.books.lock();
        let final_balance_cents = {
            let account = Self::authenticate(&books, username, password, account_no)?;
            account.balance_cents
        };
        books.accounts.remove(account_no);
        books.usernames.remove(username);
        Ok(CloseAccountResult { final_balance_cents })
    }

    fn deposit(
        &self,
        username: &str,
        password: &str,
        account_no: &str,
        amount_cents: i64,
    ) -> BankResult<BalanceResult> {
        let mut books = self.books.lock();
        Self::authenticate(&books, username, password, account_no)?;
        let account = books.accounts.get_mut(account_no).expect("checked above");
        account.balance_cents += amount_cents;
        Ok(BalanceResult {
            new_balance_cents: account.balance_cents,
        })
    }

    fn withdraw(
        &self,
        username: &str,
        password: &str,
        account_no: &str,
        amount_cents: i64,
    ) -> BankResult<BalanceResult> {
        let mut books = self.books.lock();
        Self::authenticate(&books, username, password, account_no)?;
        let account = books.accounts.get_mut(account_no).expect("checked above");
        if account.balance_cents < amount_cents {
            return Err(Status::InsufficientFunds);
        }
        account.balance_cents -= amount_cents;
        Ok(BalanceResult {
            new_balance_cents: account.balance_cents,
        })
    }

    fn query_balance(
        &self,
        username: &str,
        password: &str,
        account_no: &str,
    ) -> BankResult<QueryBalanceResult> {
        let books = self.books.lock();
        let account = Self::authenticate(&books, username, password, account_no)?;
        Ok(QueryBalanceResult {
            balance_cents: account.balance_cents,
            currency: account.currency,
        })
    }

    fn transfer(
        &self,
        username: &str,
        password: &str,
        from_account: &str,
        to_account: &str,
        amount_cents: i64,
    ) -> BankResult<TransferResult> {
        let mut books = self.books.lock();
        {
            let source = Self::authenticate(&books, username, password, from_account)?;
            if source.balance_cents < amount_cents {
                return Err(Status::InsufficientFunds);
            }
        }
        if !books.accounts.contains_key(to_account) {
            return Err(Status::NotFound);
        }
        if books.accounts[from_account].currency != books.accounts[to_account].currency {
            return Err(Status::CurrencyMismatch);
        }

        books.accounts.get_mut(from_account).unwrap().balance_cents -= amount_cents;
        books.accounts.get_mut(to_account).unwrap().balance_cents += amount_cents;

        Ok(TransferResult {
            new_source_balance_cents: books.accounts[from_account].balance_cents,
            new_dest_balance_cents: books.accounts[to_account].balance_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> InMemoryBank {
        InMemoryBank::new()
    }

    #[test]
    fn open_account_then_duplicate_username_rejected() {
        let bank = bank();
        let opened = bank
            .open_account("alice", "pw", Currency::Sgd, 100_000)
            .unwrap();
        assert_eq!(opened.balance_cents, 100_000);

        let err = bank
            .open_account("alice", "pw2", Currency::Usd, 0)
            .unwrap_err();
        assert_eq!(err, Status::AlreadyExists);
    }

    #[test]
    fn deposit_and_withdraw_update_balance() {
        let bank = bank();
        let acc = bank
            .open_account("bob", "pw", Currency::Sgd, 100_000)
            .unwrap();
        let after_deposit = bank
            .deposit("bob", "pw", &acc.account_no, 5_000)
            .unwrap();
        assert_eq!(after_deposit.new_balance_cents, 105_000);

        let after_withdraw = bank
            .withdraw("bob", "pw", &acc.account_no, 10_000)
            .unwrap();
        assert_eq!(after_withdraw.new_balance_cents, 95_000);
    }

    #[test]
    fn withdraw_more_than_balance_is_insufficient_funds() {
        let bank = bank();
        let acc = bank
            .open_account("carol", "pw", Currency::Sgd, 1_000)
            .unwrap();
        let err = bank.withdraw("carol", "pw", &acc.account_no, 2_000).unwrap_err();
        assert_eq!(err, Status::InsufficientFunds);
    }

    #[test]
    fn wrong_password_is_auth_fail() {
        let bank = bank();
        let acc = bank
            .open_account("dave", "pw", Currency::Sgd, 1_000)
            .unwrap();
        let err = bank
            .query_balance("dave", "wrong", &acc.account_no)
            .unwrap_err();
        assert_eq!(err, Status::AuthFail);
    }

    #[test]
    fn transfer_moves_funds_atomically() {
        let bank = bank();
        let a = bank
            .open_account("eve", "pw", Currency::Sgd, 100_000)
            .unwrap();
        let b = bank
            .open_account("frank", "pw", Currency::Sgd, 100_000)
            .unwrap();

        let result = bank
            .transfer("eve", "pw", &a.account_no, &b.account_no, 10_000)
            .unwrap();
        assert_eq!(result.new_source_balance_cents, 90_000);
        assert_eq!(result.new_dest_balance_cents, 110_000);
    }

    #[test]
    fn transfer_rejects_currency_mismatch() {
        let bank = bank();
        let a = bank
            .open_account("gina", "pw", Currency::Sgd, 100_000)
            .unwrap();
        let b = bank
            .open_account("hank", "pw", Currency::Usd, 100_000)
            .unwrap();

        let err = bank
            .transfer("gina", "pw", &a.account_no, &b.account_no, 10_000)
            .unwrap_err();
        assert_eq!(err, Status::CurrencyMismatch);
    }

    #[test]
    fn close_account_returns_final_balance_and_frees_username() {
        let bank = bank();
        let acc = bank
            .open_account("ivan", "pw", Currency::Sgd, 50_000)
            .unwrap();
        let closed = bank.close_account("ivan", "pw", &acc.account_no).unwrap();
        assert_eq!(closed.final_balance_cents, 50_000);

        // username freed up for reuse
        let reopened = bank.open_account("ivan", "pw2", Currency::Sgd, 0).unwrap();
        assert_ne!(reopened.account_no, acc.account_no);
    }
}
