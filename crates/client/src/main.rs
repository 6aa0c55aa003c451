use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};

use labeldesk_client::services::dto::{BarcodeQuery, OrderQuery};
use labeldesk_client::{ClientConfig, Console};
use labeldesk_core::{FileStorage, JsonStorage};
use labeldesk_print::{LabelData, PrintTemplate};

const STATE_DIR_VAR: &str = "LABELDESK_STATE_DIR";
const DEFAULT_STATE_DIR: &str = ".labeldesk";

const USAGE: &str = "usage: labeldesk <command>

commands:
  login <username> <password>
  logout
  whoami
  menu
  orders [page]
  barcodes <code>
  print <standard|compact|shipping> <barcode> [copies]
  history";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    labeldesk_observability::init();

    let config = ClientConfig::from_env()?;
    let state_dir = std::env::var(STATE_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR));
    let backend = FileStorage::open(state_dir.clone())
        .with_context(|| format!("opening state directory {}", state_dir.display()))?;
    let console = Console::open(config, JsonStorage::new(Arc::new(backend)));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["login", username, password] => {
            let response = console.auth().login(username, password).await?;
            println!(
                "logged in as {} ({} permissions)",
                response.user_info.username.as_deref().unwrap_or(&response.user_info.user_id),
                response.permissions.len()
            );
        }
        ["logout"] => {
            console.auth().logout().await?;
            println!("logged out");
        }
        ["whoami"] => {
            let profile = console
                .session
                .user_profile()
                .filter(|_| console.session.is_logged_in());
            match profile {
                Some(profile) => {
                    let granted = console.permissions.snapshot().to_sorted_vec();
                    println!("{}", serde_json::to_string_pretty(&profile)?);
                    println!("permissions: {}", granted.join(", "));
                }
                None => println!("not logged in"),
            }
        }
        ["menu"] => println!("{}", serde_json::to_string_pretty(&console.menu())?),
        ["orders", rest @ ..] => {
            let mut query = OrderQuery::default();
            if let [page] = rest {
                query.page.page = page.parse().context("page must be a positive integer")?;
            }
            let page = console.orders().list(&query).await?;
            for order in &page.list {
                println!("{}\t{:?}\t{}", order.order_no, order.status, order.quantity);
            }
            println!("page {} of {} total", page.page, page.total);
        }
        ["barcodes", code] => {
            let query = BarcodeQuery {
                barcode: Some(code.to_string()),
                ..BarcodeQuery::default()
            };
            let page = console.barcodes().search(&query).await?;
            for record in &page.list {
                println!(
                    "{}\t{}\tprinted {}x",
                    record.barcode,
                    record.order_no.as_deref().unwrap_or("-"),
                    record.printed_count
                );
            }
        }
        ["print", template, barcode, rest @ ..] => {
            let template = parse_template(template)?;
            let copies = match rest {
                [] => 1,
                [copies] => copies.parse().context("copies must be a positive integer")?,
                _ => bail!(USAGE),
            };
            let receipt = console
                .printing()
                .print(template, &LabelData::new(*barcode), copies)
                .await?;
            println!("job {} {:?}", receipt.job_id, receipt.status);
        }
        ["history"] => {
            for entry in console.print_log.entries() {
                println!(
                    "{}\t{:?}\t{}\tx{}\t{}",
                    entry.printed_at.to_rfc3339(),
                    entry.template,
                    entry.barcode,
                    entry.copies,
                    entry.operator.as_deref().unwrap_or("-")
                );
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn parse_template(name: &str) -> anyhow::Result<PrintTemplate> {
    PrintTemplate::ALL
        .into_iter()
        .find(|t| format!("{t:?}").eq_ignore_ascii_case(name))
        .with_context(|| format!("unknown template '{name}'"))
}
