//! Shell layer - a line-oriented console interface to the store.
//!
//! Reads one command per line from stdin and writes plain text and tables to
//! stdout. A failed command prints its error and the loop carries on; only
//! `quit` or end of input stops the shell.

/// Administrator commands
pub mod admin;
/// Customer and guest commands
pub mod customer;
/// Argument parsing helpers
pub mod parse;
/// Table rendering
pub mod tables;

use crate::{
    config::settings::Settings,
    core::{account::Session, cart::CartRegistry, checkout::WriteGate},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Shared state available to every shell command.
/// Holds the database connection, the in-memory carts, the write gate used by
/// order placement and cancellation, and the loaded settings.
pub struct Shop {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Per-account carts
    pub carts: CartRegistry,
    /// Serializes order placement and cancellation
    pub write_gate: WriteGate,
    /// Thresholds from config.toml
    pub settings: Settings,
}

impl Shop {
    /// Creates the shared context with empty carts.
    #[must_use]
    pub fn new(database: DatabaseConnection, settings: Settings) -> Self {
        Self {
            database,
            carts: CartRegistry::new(),
            write_gate: WriteGate::default(),
            settings,
        }
    }
}

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the text and read the next line
    Continue(String),
    /// Stop reading input
    Quit,
}

const HELP: &str = "\
Account:   register <user> <password> [name] [email] [phone] [address]
           login <user> <password> | logout | whoami
           passwd <old> <new> | profile [name email phone address]
Catalog:   laptops | laptop <id> | search <text> | filter brand|ram|os <value>
Cart:      cart | cart add <laptop> [qty] | cart set <laptop> <qty>
           cart remove <laptop> | cart clear
Orders:    checkout <CASH_ON_DELIVERY|BANK_TRANSFER|CREDIT_CARD> [address]
           orders | order <id> | cancel <id>
Warranty:  warranty | warranty request <order> <laptop> <reason> | warranty show <id>
Admin:     laptop-add <name> <brand> <cpu> <ram> <os> <color> <price> <stock>
           laptop-update <id> <name> <brand> <cpu> <ram> <os> <color> <price> <stock>
           laptop-delete <id> | stock-set <id> <qty> | alerts
           restock <laptop> <qty> <supplier> [contact] [notes] | receipts [laptop]
           orders [all|<STATUS>] | order-status <id> <STATUS> | order-payment <id> <PAID|UNPAID>
           accounts [search] | account-add <user> <password> <ADMIN|USER> [name]
           account-role <id> <ADMIN|USER> | account-reset <id> <password> | account-delete <id>
           warranty all|pending|<STATUS> | warranty-decide <id> <approve|reject> [notes]
           report daily [YYYY-MM-DD] | report monthly [YYYY-MM] | report products
           report brands | report customers | report inventory
Other:     help | quit";

/// Interpreter state: the shop and whoever is logged in.
pub struct Shell<'a> {
    shop: &'a Shop,
    session: Option<Session>,
}

impl<'a> Shell<'a> {
    /// Starts a shell with nobody logged in.
    #[must_use]
    pub const fn new(shop: &'a Shop) -> Self {
        Self {
            shop,
            session: None,
        }
    }

    /// The logged-in session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn require_session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(|| Error::PermissionDenied {
            message: "please log in first".to_string(),
        })
    }

    fn require_admin(&self) -> Result<&Session> {
        let session = self.require_session()?;
        session.require_admin()?;
        Ok(session)
    }

    /// Prompt reflecting the current login.
    #[must_use]
    pub fn prompt(&self) -> String {
        self.session.as_ref().map_or_else(
            || "laptop-store> ".to_string(),
            |s| format!("{}@laptop-store> ", s.username),
        )
    }

    /// Runs one command line.
    ///
    /// # Errors
    /// Returns the command's error; the caller prints it and keeps going.
    pub async fn execute(&mut self, line: &str) -> Result<Outcome> {
        let words = parse::tokenize(line)?;
        let Some((command, args)) = words.split_first() else {
            return Ok(Outcome::Continue(String::new()));
        };
        debug!(command = %command, "Executing shell command");
        let shop = self.shop;

        let output = match command.to_ascii_lowercase().as_str() {
            "help" => HELP.to_string(),
            "quit" | "exit" => return Ok(Outcome::Quit),
            "register" => customer::register(shop, args).await?,
            "login" => {
                let session = customer::login(shop, args).await?;
                let greeting = format!("Welcome, {} ({}).", session.username, session.role);
                self.session = Some(session);
                greeting
            }
            "logout" => match self.session.take() {
                Some(session) => format!("Goodbye, {}.", session.username),
                None => "Nobody is logged in.".to_string(),
            },
            "whoami" => customer::whoami(shop, self.require_session()?).await?,
            "passwd" => customer::passwd(shop, self.require_session()?, args).await?,
            "profile" => customer::profile(shop, self.require_session()?, args).await?,
            "laptops" => customer::laptops(shop).await?,
            "laptop" => customer::laptop(shop, args).await?,
            "search" => customer::search(shop, args).await?,
            "filter" => customer::filter(shop, args).await?,
            "cart" => customer::cart(shop, self.require_session()?, args).await?,
            "checkout" => customer::checkout(shop, self.require_session()?, args).await?,
            "orders" => customer::orders(shop, self.require_session()?, args).await?,
            "order" => customer::order(shop, self.require_session()?, args).await?,
            "cancel" => customer::cancel(shop, self.require_session()?, args).await?,
            "warranty" => customer::warranty(shop, self.require_session()?, args).await?,
            "laptop-add" => admin::laptop_add(shop, self.require_admin()?, args).await?,
            "laptop-update" => admin::laptop_update(shop, self.require_admin()?, args).await?,
            "laptop-delete" => admin::laptop_delete(shop, self.require_admin()?, args).await?,
            "stock-set" => admin::stock_set(shop, self.require_admin()?, args).await?,
            "restock" => admin::restock(shop, self.require_admin()?, args).await?,
            "receipts" => admin::receipts(shop, self.require_admin()?, args).await?,
            "alerts" => admin::alerts(shop, self.require_admin()?).await?,
            "order-status" => admin::order_status(shop, self.require_admin()?, args).await?,
            "order-payment" => admin::order_payment(shop, self.require_admin()?, args).await?,
            "accounts" => admin::accounts(shop, self.require_admin()?, args).await?,
            "account-add" => admin::account_add(shop, self.require_admin()?, args).await?,
            "account-role" => admin::account_role(shop, self.require_admin()?, args).await?,
            "account-reset" => admin::account_reset(shop, self.require_admin()?, args).await?,
            "account-delete" => admin::account_delete(shop, self.require_admin()?, args).await?,
            "warranty-decide" => admin::warranty_decide(shop, self.require_admin()?, args).await?,
            "report" => admin::report(shop, self.require_admin()?, args).await?,
            other => {
                return Err(Error::validation(format!(
                    "unknown command '{other}', type 'help' for a list"
                )));
            }
        };
        Ok(Outcome::Continue(output))
    }
}

/// Reads commands from stdin until `quit` or end of input.
///
/// # Errors
/// Returns an error only if stdin or stdout fail; command errors are printed.
pub async fn run(shop: &Shop) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut shell = Shell::new(shop);

    stdout
        .write_all(b"Laptop store ready. Type 'help' for commands.\n")
        .await?;
    loop {
        stdout.write_all(shell.prompt().as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match shell.execute(&line).await {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Continue(output)) if output.is_empty() => {}
            Ok(Outcome::Continue(output)) => {
                stdout.write_all(output.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Err(e) => {
                warn!(kind = ?e.kind(), "Command failed: {e}");
                stdout.write_all(format!("Error: {e}\n").as_bytes()).await?;
            }
        }
    }
    info!("Shell finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;

    async fn shop() -> Result<Shop> {
        Ok(Shop::new(setup_test_db().await?, Settings::default()))
    }

    fn text(outcome: Outcome) -> String {
        match outcome {
            Outcome::Continue(text) => text,
            Outcome::Quit => String::new(),
        }
    }

    #[tokio::test]
    async fn test_guest_commands() -> Result<()> {
        let shop = shop().await?;
        let mut shell = Shell::new(&shop);

        assert!(text(shell.execute("help").await?).contains("checkout"));
        assert_eq!(text(shell.execute("   ").await?), "");
        assert_eq!(shell.execute("quit").await?, Outcome::Quit);

        let err = shell.execute("cart").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let err = shell.execute("frobnicate").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_shopping_session() -> Result<()> {
        let shop = shop().await?;
        let laptop = create_test_laptop(&shop.database, "XPS 13", 3).await?;
        let mut shell = Shell::new(&shop);

        shell
            .execute(r#"register alice wonderland "Alice Liddell" alice@example.com 555 "1 Rabbit Hole""#)
            .await?;
        let greeting = text(shell.execute("login alice wonderland").await?);
        assert!(greeting.contains("alice"));
        assert_eq!(shell.prompt(), "alice@laptop-store> ");

        let listing = text(shell.execute("laptops").await?);
        assert!(listing.contains("XPS 13"));

        shell.execute(&format!("cart add {} 2", laptop.id)).await?;
        let cart = text(shell.execute("cart").await?);
        assert!(cart.contains("$2599.98"));

        let placed = text(shell.execute("checkout credit_card").await?);
        assert!(placed.contains("1 Rabbit Hole"));
        assert!(text(shell.execute("cart").await?).contains("empty"));

        let orders = text(shell.execute("orders").await?);
        assert!(orders.contains("PENDING"));

        let err = shell.execute("laptop-add a b c 8 d e 1 1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        shell.execute("logout").await?;
        assert!(shell.session().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_command_keeps_state() -> Result<()> {
        let shop = shop().await?;
        let laptop = create_test_laptop(&shop.database, "XPS 13", 1).await?;
        let mut shell = Shell::new(&shop);
        shell.execute("register bob builder").await?;
        shell.execute("login bob builder").await?;

        let err = shell
            .execute(&format!("cart add {} 5", laptop.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(shell.session().is_some());
        assert!(text(shell.execute("cart").await?).contains("empty"));
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_shell_session() -> Result<()> {
        let shop = shop().await?;
        test_admin_session(&shop.database).await?;
        let mut shell = Shell::new(&shop);
        shell.execute("login admin admin-password").await?;

        let added = text(
            shell
                .execute(r#"laptop-add "ThinkPad X1" Lenovo i7 16 "Windows 11" Black 1499.00 4"#)
                .await?,
        );
        assert!(added.contains("ThinkPad X1"));

        let alerts = text(shell.execute("alerts").await?);
        assert!(alerts.contains("ThinkPad X1"));

        let restocked = text(shell.execute("restock 1 10 Acme sales@acme.test").await?);
        assert!(restocked.contains("14"));

        let inventory = text(shell.execute("report inventory").await?);
        assert!(inventory.contains("Units in stock: 14"));

        let accounts = text(shell.execute("accounts").await?);
        assert!(accounts.contains("admin"));
        Ok(())
    }
}
