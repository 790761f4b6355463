//! Interactive storefront shell.
//!
//! Reads one command per line from stdin. Notification banners are printed
//! by a background task as they are pushed, so a sync failure that happens
//! after the debounce delay still shows up.

use std::io::Write;

use doghouse_core::{ProductId, Quantity};
use doghouse_storefront::Storefront;
use doghouse_storefront::api::{Order, ProfileUpdate, UserProfile};
use doghouse_storefront::cart::CartState;
use doghouse_storefront::error::StorefrontError;
use doghouse_storefront::notify::{Notification, NotificationKind, NotificationSink};
use doghouse_storefront::services::{AuthError, SignupForm};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

use super::products;

const HELP: &str = "\
Commands:
  login <username>              Log in (prompts for password)
  signup <username> <email>     Create an account
  logout                        Log out
  products                      List products
  add <id> [qty]                Add a product to the cart
  remove <id>                   Remove a product from the cart
  qty <id> <n>                  Set a quantity (0 removes)
  clear                         Empty the cart
  cart                          Show the cart
  open | close                  Show or hide the cart panel
  checkout                      Place the order
  history                       Show past orders
  profile                       Show account details
  profile set <field> <value>   Change username, email, first_name,
                                last_name, address, contact, or password
  help                          Show this help
  quit                          Leave the shell";

/// Editable account fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileField {
    Username,
    Email,
    FirstName,
    LastName,
    Address,
    Contact,
    Password,
}

impl ProfileField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "username" => Some(Self::Username),
            "email" => Some(Self::Email),
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "address" => Some(Self::Address),
            "contact" => Some(Self::Contact),
            "password" => Some(Self::Password),
            _ => None,
        }
    }

    fn apply(self, update: &mut ProfileUpdate, value: String) {
        match self {
            Self::Username => update.username = value,
            Self::Email => update.email = value,
            Self::FirstName => update.first_name = value,
            Self::LastName => update.last_name = value,
            Self::Address => update.address = value,
            Self::Contact => update.contact = value,
            Self::Password => update.new_password = Some(value),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Login { username: String },
    Signup { username: String, email: String },
    Logout,
    Products,
    Add { id: ProductId, quantity: Quantity },
    Remove(ProductId),
    SetQuantity { id: ProductId, quantity: u32 },
    Clear,
    Cart,
    Open,
    Close,
    Checkout,
    History,
    Profile,
    ProfileSet { field: ProfileField, value: String },
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (name, args.as_slice()) {
        ("login", [username]) => Command::Login {
            username: (*username).to_string(),
        },
        ("signup", [username, email]) => Command::Signup {
            username: (*username).to_string(),
            email: (*email).to_string(),
        },
        ("logout", []) => Command::Logout,
        ("products", []) => Command::Products,
        ("add", [id]) => Command::Add {
            id: parse_id(id)?,
            quantity: Quantity::ONE,
        },
        ("add", [id, quantity]) => Command::Add {
            id: parse_id(id)?,
            quantity: Quantity::new(parse_count(quantity)?).map_err(|e| e.to_string())?,
        },
        ("remove", [id]) => Command::Remove(parse_id(id)?),
        ("qty", [id, quantity]) => Command::SetQuantity {
            id: parse_id(id)?,
            quantity: parse_count(quantity)?,
        },
        ("clear", []) => Command::Clear,
        ("cart", []) => Command::Cart,
        ("open", []) => Command::Open,
        ("close", []) => Command::Close,
        ("checkout", []) => Command::Checkout,
        ("history", []) => Command::History,
        ("profile", []) => Command::Profile,
        ("profile", ["set", field, rest @ ..]) if !rest.is_empty() => Command::ProfileSet {
            field: ProfileField::parse(field).ok_or_else(|| format!("Unknown field: {field}"))?,
            value: rest.join(" "),
        },
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => {
            return Err(format!(
                "Unknown command: {}. Type `help` for a list.",
                line.trim()
            ));
        }
    };
    Ok(Some(command))
}

fn parse_id(value: &str) -> Result<ProductId, String> {
    value
        .parse()
        .map_err(|_| format!("Not a product id: {value}"))
}

fn parse_count(value: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("Not a quantity: {value}"))
}

/// Run the shell until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if reading stdin or writing stdout fails.
pub async fn run(storefront: &Storefront) -> Result<(), StorefrontError> {
    let banners = tokio::spawn(print_banners(storefront.notifications().events()));

    println!("Doghouse storefront. Type `help` for commands.");
    let mut shell = Shell {
        storefront,
        input: BufReader::new(tokio::io::stdin()).lines(),
    };

    while let Some(line) = shell.prompt("> ").await? {
        match parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => shell.execute(command).await?,
            Err(message) => println!("{message}"),
        }
    }

    banners.abort();
    Ok(())
}

async fn print_banners(mut events: broadcast::Receiver<Notification>) {
    loop {
        match events.recv().await {
            Ok(notification) => println!("{}", format_banner(&notification)),
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn format_banner(notification: &Notification) -> String {
    let marker = match notification.kind {
        NotificationKind::Success => "[ok]",
        NotificationKind::Error => "[!!]",
    };
    format!("{marker} {}: {}", notification.title, notification.message)
}

struct Shell<'a> {
    storefront: &'a Storefront,
    input: Lines<BufReader<Stdin>>,
}

impl Shell<'_> {
    async fn prompt(&mut self, label: &str) -> Result<Option<String>, StorefrontError> {
        print!("{label}");
        std::io::stdout().flush()?;
        Ok(self.input.next_line().await?)
    }

    fn notify(&self, notification: Notification) {
        self.storefront.notifications().notify(notification);
    }

    async fn execute(&mut self, command: Command) -> Result<(), StorefrontError> {
        let storefront = self.storefront;
        let cart = storefront.cart();

        match command {
            Command::Login { username } => self.login(&username).await?,
            Command::Signup { username, email } => self.signup(username, email).await?,
            Command::Logout => {
                storefront.auth().logout().await;
                println!("Logged out.");
            }
            Command::Products => {
                if let Err(err) = products::list(storefront).await {
                    self.report_error("Error", err);
                }
            }
            Command::Add { id, quantity } => {
                match storefront.catalog().line_item(id, quantity).await {
                    Ok(Some(item)) => cart.add_item(item),
                    Ok(None) => println!("No product with id {id}."),
                    Err(err) => self.report_error("Error", err.into()),
                }
            }
            Command::Remove(id) => {
                if cart.state().get(id).is_none() {
                    println!("Product {id} is not in your cart.");
                } else {
                    cart.remove_item(id);
                }
            }
            Command::SetQuantity { id, quantity } => {
                if cart.state().get(id).is_none() {
                    println!("Product {id} is not in your cart.");
                } else {
                    cart.update_quantity(id, quantity);
                }
            }
            Command::Clear => cart.clear_cart(),
            Command::Cart => print_cart(&cart.state()),
            Command::Open => {
                cart.open_cart();
                print_cart(&cart.state());
            }
            Command::Close => cart.close_cart(),
            Command::Checkout => {
                if let Ok(receipt) = cart.checkout().await
                    && !receipt.message.is_empty()
                {
                    println!("{}", receipt.message);
                }
            }
            Command::History => self.history().await,
            Command::Profile => self.profile().await,
            Command::ProfileSet { field, value } => self.update_profile(field, value).await?,
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
        Ok(())
    }

    async fn login(&mut self, username: &str) -> Result<(), StorefrontError> {
        let Some(password) = self.prompt("Password: ").await? else {
            return Ok(());
        };
        match self.storefront.auth().login(username, &password).await {
            Ok(()) => println!("Logged in as {username}."),
            Err(err) => self.report_auth("Login Failed", err),
        }
        Ok(())
    }

    async fn signup(&mut self, username: String, email: String) -> Result<(), StorefrontError> {
        let mut answers = Vec::with_capacity(6);
        for label in [
            "Password: ",
            "Confirm password: ",
            "First name: ",
            "Last name: ",
            "Address: ",
            "Contact number: ",
        ] {
            let Some(answer) = self.prompt(label).await? else {
                return Ok(());
            };
            answers.push(answer);
        }
        let mut answers = answers.into_iter();
        let mut next = || answers.next().unwrap_or_default();

        let form = SignupForm {
            username,
            email,
            password: next(),
            confirm_password: next(),
            first_name: next(),
            last_name: next(),
            address: next(),
            contact: next(),
        };

        match self.storefront.auth().register(form).await {
            Ok(message) => self.notify(Notification::success("Account Created", message)),
            Err(err) => self.report_auth("Signup Failed", err),
        }
        Ok(())
    }

    async fn history(&self) {
        let account = self.storefront.account();
        let result = match account.require_session().await {
            Ok(()) => account.order_history().await,
            Err(err) => Err(err),
        };
        match result {
            Ok(orders) => print_orders(&orders),
            Err(err) => self.report_auth("Error", err),
        }
    }

    async fn profile(&self) {
        let account = self.storefront.account();
        let result = match account.require_session().await {
            Ok(()) => account.profile().await,
            Err(err) => Err(err),
        };
        match result {
            Ok(profile) => print_profile(&profile),
            Err(err) => self.report_auth("Error", err),
        }
    }

    async fn update_profile(
        &mut self,
        field: ProfileField,
        value: String,
    ) -> Result<(), StorefrontError> {
        let account = self.storefront.account().clone();
        let profile = match account.require_session().await {
            Ok(()) => account.profile().await,
            Err(err) => Err(err),
        };
        let profile = match profile {
            Ok(profile) => profile,
            Err(err) => {
                self.report_auth("Error", err);
                return Ok(());
            }
        };

        let mut update = ProfileUpdate::from_profile(&profile);
        field.apply(&mut update, value);
        let Some(current_password) = self.prompt("Current password: ").await? else {
            return Ok(());
        };
        update.current_password = current_password;

        match account.update_profile(&update).await {
            Ok(()) => self.notify(Notification::success(
                "Profile Updated",
                "Your account information has been updated successfully",
            )),
            Err(err) => self.report_auth("Update Failed", err),
        }
        Ok(())
    }

    fn report_auth(&self, title: &str, err: AuthError) {
        let notification = match &err {
            AuthError::LoginRequired => {
                println!("Please log in first: login <username>");
                return;
            }
            AuthError::CurrentPasswordRequired => {
                Notification::error("Password Required", err.to_string())
            }
            AuthError::InvalidCredentials => {
                Notification::error(title, "Invalid username or password")
            }
            err if err.is_connection() => {
                Notification::error("Connection Error", "Failed to connect to the server")
            }
            err => Notification::error(title, err.to_string()),
        };
        StorefrontError::from(err).report();
        self.notify(notification);
    }

    fn report_error(&self, title: &str, err: StorefrontError) {
        let message = match &err {
            StorefrontError::Api(api) if api.is_transport() => "Could not connect to the server",
            _ => "Something went wrong. Please try again.",
        };
        err.report();
        self.notify(Notification::error(title, message));
    }
}

fn print_cart(state: &CartState) {
    if state.is_loading() {
        println!("(loading your cart...)");
    }
    if state.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in state.items() {
        println!(
            "{} {:>4}  {:<24} x{:<3} {:>10}",
            item.glyph,
            item.id.as_i32(),
            item.name,
            item.quantity.get(),
            item.subtotal().to_string()
        );
    }
    println!("Items: {}  Total: {}", state.item_count(), state.total());
}

fn print_orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in orders {
        println!(
            "Order #{}  {}  {}",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.total_price
        );
        for item in &order.order_items {
            println!(
                "    {} x {:<24} {:>10}",
                item.quantity,
                item.product_name,
                item.subtotal().to_string()
            );
        }
    }
}

fn print_profile(profile: &UserProfile) {
    let show = |value: &Option<String>| value.clone().unwrap_or_default();
    println!("Username:   {}", profile.username);
    println!("Email:      {}", show(&profile.email));
    println!("First name: {}", show(&profile.first_name));
    println!("Last name:  {}", show(&profile.last_name));
    println!("Address:    {}", show(&profile.address));
    println!("Contact:    {}", show(&profile.contact));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_defaults_to_one() {
        assert_eq!(
            parse("add 1").unwrap(),
            Some(Command::Add {
                id: ProductId::new(1),
                quantity: Quantity::ONE
            })
        );
        assert_eq!(
            parse("  add 2 3 ").unwrap(),
            Some(Command::Add {
                id: ProductId::new(2),
                quantity: Quantity::new(3).unwrap()
            })
        );
    }

    #[test]
    fn test_parse_rejects_zero_add() {
        assert!(parse("add 1 0").is_err());
    }

    #[test]
    fn test_parse_qty_allows_zero() {
        assert_eq!(
            parse("qty 1 0").unwrap(),
            Some(Command::SetQuantity {
                id: ProductId::new(1),
                quantity: 0
            })
        );
    }

    #[test]
    fn test_parse_profile_set_joins_value() {
        assert_eq!(
            parse("profile set address 12 Rizal Ave, Manila").unwrap(),
            Some(Command::ProfileSet {
                field: ProfileField::Address,
                value: "12 Rizal Ave, Manila".to_string()
            })
        );
        assert!(parse("profile set shoe_size 9").is_err());
    }

    #[test]
    fn test_parse_blank_and_unknown() {
        assert_eq!(parse("   ").unwrap(), None);
        assert!(parse("dance").is_err());
        assert!(parse("remove").is_err());
        assert!(parse("add one").is_err());
    }

    #[test]
    fn test_password_field_sets_new_password() {
        let mut update = ProfileUpdate::default();
        ProfileField::Password.apply(&mut update, "n3w-secret".to_string());
        assert_eq!(update.new_password.as_deref(), Some("n3w-secret"));
    }

    #[test]
    fn test_format_banner() {
        let banner = format_banner(&Notification::error(
            "Login Required",
            "Please log in to add items to your cart",
        ));
        assert_eq!(
            banner,
            "[!!] Login Required: Please log in to add items to your cart"
        );
    }
}
