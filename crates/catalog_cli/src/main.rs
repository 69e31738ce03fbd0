//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a small executable to exercise `catalog_core` end to end.
//! - Keep output machine-readable: JSON on stdout, errors on stderr.

use catalog_core::{
    search_products, CatalogConfig, ProductDraft, ProductFilter, ProductId, ProductListQuery,
    ProductService, SearchQuery, SqliteProductRepository,
};
use log::warn;
use std::error::Error;
use std::process::ExitCode;

const USAGE: &str = "usage: catalog_cli [--config FILE] [--db PATH] <command>

commands:
  ping | version
  add NAME PRICE DESCRIPTION CATEGORY
  get ID
  list [CATEGORY]
  search TEXT [--ranked]
  delete ID
  clear";

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> CliResult<()> {
    let (config, command) = parse_global_options(args)?;
    if let Err(err) = config.init_logging() {
        eprintln!("warning: logging disabled: {err}");
    }

    let Some((name, rest)) = command.split_first() else {
        return Err(USAGE.into());
    };

    match (name.as_str(), rest) {
        ("ping", []) => println!("catalog_core ping={}", catalog_core::ping()),
        ("version", []) => println!("catalog_core version={}", catalog_core::core_version()),
        _ => run_store_command(&config, name, rest)?,
    }
    Ok(())
}

fn parse_global_options(args: &[String]) -> CliResult<(CatalogConfig, &[String])> {
    let mut config_file: Option<&str> = None;
    let mut db_path: Option<&str> = None;
    let mut rest = args;

    while let [flag, value, tail @ ..] = rest {
        match flag.as_str() {
            "--config" => config_file = Some(value.as_str()),
            "--db" => db_path = Some(value.as_str()),
            _ => break,
        }
        rest = tail;
    }

    // `--db` wins over the file and the environment, whatever the flag order.
    let mut config = match config_file {
        Some(path) => {
            let mut loaded = CatalogConfig::from_json_file(path)?;
            loaded.apply_env(|key| std::env::var(key).ok());
            loaded
        }
        None => CatalogConfig::from_env(),
    };
    if let Some(path) = db_path {
        config.db_path = Some(path.into());
    }
    Ok((config, rest))
}

fn run_store_command(config: &CatalogConfig, name: &str, args: &[String]) -> CliResult<()> {
    if config.db_path.is_none() {
        warn!("event=cli_store module=cli status=warn reason=in_memory_store");
    }
    let conn = config.open_store()?;
    let service = ProductService::new(SqliteProductRepository::try_new(&conn)?);

    match (name, args) {
        ("add", [product_name, price, description, category]) => {
            let draft = ProductDraft::new(
                product_name.as_str(),
                price.as_str(),
                description.as_str(),
                category.as_str(),
            );
            print_json(&service.create_product(&draft)?)
        }
        ("get", [id]) => print_json(&service.get_product(parse_id(id)?)?),
        ("list", []) => print_json(&service.find_products(&ProductListQuery::default())?),
        ("list", [category]) => print_json(&service.list_by_category(category)?),
        ("search", [text, flags @ ..]) => {
            let mut query = SearchQuery::new(text.as_str());
            match flags {
                [] => {}
                [flag] if flag == "--ranked" => query = query.ranked(),
                _ => return Err(USAGE.into()),
            }
            let products: Vec<_> = search_products(&conn, &query)?
                .into_iter()
                .map(|hit| hit.product)
                .collect();
            print_json(&products)
        }
        ("delete", [id]) => print_json(&service.delete_product(parse_id(id)?)?),
        ("clear", []) => print_json(&service.delete_products(&ProductFilter::all())?),
        _ => Err(USAGE.into()),
    }
}

fn parse_id(text: &str) -> CliResult<ProductId> {
    ProductId::parse_str(text.trim())
        .map_err(|err| format!("invalid product id `{text}`: {err}").into())
}

fn print_json(value: &impl serde::Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
