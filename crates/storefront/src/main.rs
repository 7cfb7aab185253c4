use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use storefront::api::{BusinessType, BusinessTypeFilter, HttpApi, MarketplaceApi, SearchQuery};
use storefront::config::{self, StorefrontConfig};
use storefront::forms::card::{CardForm, CardSection, SubmitResult};
use storefront::images::ResourcePath;
use storefront::keywords::KeywordInput;
use storefront::outcome::Outcome;
use storefront::validation::card;
use storefront::views::{SaleListingView, SalesSummary};
use storefront::{Error, Result};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the storefront TOML config (defaults apply when missing)
    #[arg(long, default_value = "storefront.toml")]
    config: PathBuf,
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search users or businesses
    Search {
        #[command(subcommand)]
        target: SearchTarget,
    },
    /// Show a sale listing
    Listing { business_id: u64, listing_id: u64 },
    /// Marketplace cards
    Card {
        #[command(subcommand)]
        action: CardAction,
    },
    /// Normalize keyword text and optionally autocomplete the keyword at the cursor
    Keywords {
        text: String,
        /// Byte offset of the cursor (defaults to the end)
        #[arg(long)]
        cursor: Option<usize>,
        /// Replace the keyword under the cursor with this word
        #[arg(long)]
        complete: Option<String>,
    },
    /// This week's sales totals for the business being acted as
    Sales,
    /// Print the fully-resolved config (after extends)
    Resolve,
    /// Terminal UI (listing viewer + card editor)
    Tui {
        /// Open a listing as `<business_id> <listing_id>`
        #[arg(long, num_args = 2, value_names = ["BUSINESS_ID", "LISTING_ID"])]
        listing: Option<Vec<u64>>,
    },
}

#[derive(Debug, Subcommand)]
enum SearchTarget {
    Users {
        query: String,
        /// 1-based results page
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Businesses {
        query: String,
        /// Restrict to one business type, e.g. "Retail Trade"
        #[arg(long)]
        business_type: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[derive(Debug, Subcommand)]
enum CardAction {
    /// Create a card as the configured user
    Create {
        #[arg(long)]
        title: String,
        /// ForSale, Wanted or Exchange
        #[arg(long)]
        section: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Space separated keywords, e.g. "#Vintage #Car"
        #[arg(long, default_value = "")]
        keywords: String,
        /// Creator user id (administrators only)
        #[arg(long)]
        creator: Option<String>,
    },
}

fn init_logging(format: LogFormat) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_writer(std::io::stderr)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.log_format);

    let path = args.config.as_path();
    match args.cmd {
        Command::Search { target } => cmd_search(&config::load_or_default(path)?, target),
        Command::Listing {
            business_id,
            listing_id,
        } => cmd_listing(&config::load_or_default(path)?, business_id, listing_id),
        Command::Card { action } => cmd_card(&config::load_or_default(path)?, action),
        Command::Keywords {
            text,
            cursor,
            complete,
        } => cmd_keywords(&text, cursor, complete.as_deref()),
        Command::Sales => cmd_sales(&config::load_or_default(path)?),
        Command::Resolve => cmd_resolve(path),
        Command::Tui { listing } => {
            let listing = listing.and_then(|ids| match ids.as_slice() {
                [business, listing] => Some((*business, *listing)),
                _ => None,
            });
            storefront::ui::run_tui(&config::load_or_default(path)?, listing)
        }
    }
}

fn outcome_error(outcome: Outcome) -> Error {
    match (outcome.message, outcome.redirect) {
        (Some(message), _) => Error::msg(message),
        (None, Some(route)) => Error::msg(format!("redirected to {}", route.path())),
        (None, None) => Error::msg(format!("request failed ({:?})", outcome.kind)),
    }
}

fn cmd_resolve(path: &Path) -> Result<()> {
    let doc = config::load(path)?;
    // Best-effort pretty print of resolved config.
    let s = toml::to_string_pretty(&doc.value).unwrap_or_else(|_| format!("{:?}", doc.value));
    print!("{s}");
    Ok(())
}

fn cmd_search(cfg: &StorefrontConfig, target: SearchTarget) -> Result<()> {
    let api = HttpApi::from_config(cfg)?;
    match target {
        SearchTarget::Users { query, page } => {
            let q = SearchQuery::users(&query)
                .with_page(page)
                .with_page_size(cfg.search.page_size);
            let reply = api.search_users(&q)?;
            for user in &reply.data {
                println!("{:>6}  {:<30}  {}", user.id, user.full_name(), user.location());
            }
            print_paging(reply.total_rows, reply.total_pages, page);
        }
        SearchTarget::Businesses {
            query,
            business_type,
            page,
        } => {
            let filter = match business_type.as_deref() {
                None => BusinessTypeFilter::Any,
                Some(raw) => BusinessTypeFilter::parse(raw)
                    .ok_or_else(|| Error::msg(format!("unknown business type '{raw}'")))?,
            };
            let q = SearchQuery::businesses(&query, filter)
                .with_page(page)
                .with_page_size(cfg.search.page_size);
            let reply = api.search_businesses(&q)?;
            for business in &reply.data {
                let kind = business
                    .business_type
                    .as_deref()
                    .map(|t| BusinessType::from_backend(t).display_name())
                    .unwrap_or("");
                println!("{:>6}  {:<30}  {}", business.id, business.name, kind);
            }
            print_paging(reply.total_rows, reply.total_pages, page);
        }
    }
    Ok(())
}

fn print_paging(total_rows: Option<u64>, total_pages: Option<u64>, page: u32) {
    if let (Some(rows), Some(pages)) = (total_rows, total_pages) {
        println!("page {page} of {pages} ({rows} results)");
    }
}

fn cmd_listing(cfg: &StorefrontConfig, business_id: u64, listing_id: u64) -> Result<()> {
    let api = HttpApi::from_config(cfg)?;
    let session = cfg.session.session();
    let resources = ResourcePath::new(cfg.api.resolved_resource_base());
    let view = SaleListingView::load(
        &api,
        &session,
        business_id,
        listing_id,
        resources,
        cfg.carousel.num_visible,
    )
    .map_err(outcome_error)?;

    println!("{}", view.product_name);
    println!(
        "{}{} {}  x{}",
        view.currency_symbol, view.price, view.currency_code, view.quantity
    );
    if let Some(start) = &view.start_date {
        println!("listed:  {start}");
    }
    if let Some(close) = &view.close_date {
        println!("closes:  {close}");
    }
    println!("seller:  {}", view.business_name);
    for line in view.address_lines.iter().flatten() {
        println!("         {line}");
    }
    println!("bookmarks: {}", view.total_bookmarks);
    println!("image:   {}", view.main_image());
    let barcode = view.barcode_image();
    if !barcode.is_empty() {
        println!("barcode: {barcode}");
    }
    Ok(())
}

fn cmd_card(cfg: &StorefrontConfig, action: CardAction) -> Result<()> {
    let CardAction::Create {
        title,
        section,
        description,
        keywords,
        creator,
    } = action;

    let api = HttpApi::from_config(cfg)?;
    let mut session = cfg.session.session();
    if let Some(user_id) = session.user_id() {
        match api.get_user(user_id) {
            Ok(reply) => {
                if let Some(role) = reply.data.role {
                    session.set_role(role);
                }
            }
            Err(err) => tracing::warn!(user_id, %err, "could not fetch user role"),
        }
    }

    let mut form = CardForm::with_overrides(cfg.validation_overrides(card::FORM))?;
    form.set_title(&title);
    form.set_description(&description);
    form.set_keywords(&keywords);
    if let Some(section) = CardSection::parse(&section) {
        form.select_section(section);
    }
    if let Some(creator) = creator {
        form.set_creator_id(&creator);
    }

    match form.submit(&api, &session) {
        SubmitResult::Saved { card_id } => {
            match card_id {
                Some(id) => println!("card {id} created"),
                None => println!("card created"),
            }
            Ok(())
        }
        SubmitResult::Blocked => {
            for (field, message) in [
                ("creator", form.creator_id.error_message()),
                ("section", form.section_error.message()),
                ("title", form.title.error_message()),
                ("description", form.description.error_message()),
                ("keywords", form.keywords_error.message()),
            ] {
                if !message.is_empty() {
                    eprintln!("{field}: {message}");
                }
            }
            Err(Error::msg("card not created"))
        }
        SubmitResult::Redirect(route) => Err(Error::msg(format!(
            "not logged in (redirected to {})",
            route.path()
        ))),
        SubmitResult::Failed(outcome) => Err(outcome_error(outcome)),
    }
}

fn cmd_keywords(text: &str, cursor: Option<usize>, complete: Option<&str>) -> Result<()> {
    let mut input = KeywordInput::new(text);
    match cursor {
        Some(pos) => input.set_cursor(pos),
        None => input.cursor_to_end(),
    }
    if let Some(word) = complete {
        input.update_keyword(word);
    }
    input.normalize();
    println!("{}", input.text());
    println!("cursor: {}", input.cursor());
    if let Some(current) = input.current_keyword() {
        println!("current: {current}");
    }
    println!("keywords: {}", input.keywords().join(", "));
    Ok(())
}

fn cmd_sales(cfg: &StorefrontConfig) -> Result<()> {
    let api = HttpApi::from_config(cfg)?;
    let session = cfg.session.session();
    let today = chrono::Utc::now().date_naive();
    let summary = SalesSummary::load(&api, &session, today).map_err(outcome_error)?;
    if summary.hide_graph && summary.business_id.is_none() {
        println!("not acting as a business");
        return Ok(());
    }
    println!("{}", summary.total_sales_label());
    println!("{}", summary.total_revenue_label());
    if let Some(route) = summary.sales_route() {
        println!("full report: {}", route.path());
    }
    Ok(())
}
