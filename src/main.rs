//! Пример CLI: объединяет сохранённые позиции с котировками и печатает сводку.

use std::env;
use std::fs::File;

use stock_advisor::{
    AdvisorConfig, FileStore, PortfolioStore, default_stocks, quotes_from_reader, summarize,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let (Some(store_dir), Some(quotes_path)) = (args.next(), args.next()) else {
        println!("Usage: stock-advisor <store-dir> <quotes.json>");
        return Ok(());
    };

    let config = AdvisorConfig::from_env()?;
    let mut book = PortfolioStore::new(FileStore::new(&store_dir));
    let views = book.init(&default_stocks())?;

    let quotes = quotes_from_reader(File::open(&quotes_path)?)?;
    let positions = book.merge_quotes(&quotes, &config)?;
    let summary = summarize(&positions);

    println!("Просмотров: {views}, позиций: {}", positions.len());
    for item in &positions {
        let label = format!("{} {}", item.stock.symbol, item.stock.name);
        let Some(price) = item.price else {
            println!("{label}: нет котировки");
            continue;
        };
        let rate = item
            .earn_rate
            .map_or_else(|| "n/a".to_string(), |rate| rate.round_dp(4).to_string());
        match (&item.advice, &item.adjustment) {
            (Some(advice), Some(adjustment)) => {
                let action = if adjustment.is_buy_more() {
                    "докупить"
                } else {
                    "сократить"
                };
                println!(
                    "{label}: цена {price}, доходность {rate}, {action} {} шт. на {}",
                    advice.approximation.x, advice.amount
                );
            }
            _ => println!("{label}: цена {price}, доходность {rate}"),
        }
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
