//! Sector ETF membership from the issuer's daily holdings workbook

use std::io::Cursor;
use std::sync::Arc;

use calamine::{Data, Reader, Xlsx};
use tracing::{info, warn};

use crate::constants::HOLDINGS_CACHE_TTL_MS;
use crate::error::{AppError, Result};
use crate::models::Holding;
use crate::services::cache::PriceCache;
use crate::services::fetch::Fetch;

pub struct HoldingsService<F: Fetch> {
    fetcher: Arc<F>,
    cache: PriceCache,
}

impl<F: Fetch> HoldingsService<F> {
    pub fn new(fetcher: Arc<F>, cache: PriceCache) -> Self {
        Self { fetcher, cache }
    }

    /// Current holdings of `sector`, cached for 12 hours
    pub async fn get_holdings(&self, sector: &str) -> Result<Vec<Holding>> {
        let key = cache_key(sector);
        if let Some(value) = self.cache.get(&key, HOLDINGS_CACHE_TTL_MS).await {
            match serde_json::from_value::<Vec<Holding>>(value) {
                Ok(holdings) if !holdings.is_empty() => return Ok(holdings),
                Ok(_) => {}
                Err(e) => warn!(sector = sector, error = %e, "Ignoring malformed cached holdings"),
            }
        }

        let bytes = self.fetcher.fetch_binary(&holdings_url(sector)).await?;
        let holdings = parse_workbook(&bytes, sector)?;
        if holdings.is_empty() {
            return Err(AppError::InvalidPayload(format!(
                "{}: holdings workbook had no usable rows",
                sector
            )));
        }
        info!(sector = sector, count = holdings.len(), "Fetched holdings");

        match serde_json::to_value(&holdings) {
            Ok(value) => self.cache.set(&key, value).await,
            Err(e) => warn!(sector = sector, error = %e, "Holdings not cacheable"),
        }
        Ok(holdings)
    }
}

fn cache_key(sector: &str) -> String {
    format!("h:{}", sector.to_uppercase())
}

fn holdings_url(sector: &str) -> String {
    format!(
        "https://www.ssga.com/us/en/intermediary/library-content/products/fund-data/etfs/us/holdings-daily-us-en-{}.xlsx",
        sector.to_lowercase()
    )
}

fn parse_workbook(bytes: &[u8], sector: &str) -> Result<Vec<Holding>> {
    let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::Parse(format!("{}: XLSX error: {}", sector, e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::InvalidPayload(format!("{}: workbook has no sheets", sector)))?
        .map_err(|e| AppError::Parse(format!("{}: XLSX error: {}", sector, e)))?;

    holdings_from_rows(range.rows(), sector)
}

/// Scan rows for the header (issuer workbooks carry a preamble above
/// it), then collect one Holding per data row below. Cash lines and
/// placeholder tickers are skipped.
fn holdings_from_rows<'a, I>(rows: I, sector: &str) -> Result<Vec<Holding>>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut rows = rows.into_iter();

    let mut ticker_col = None;
    let mut name_col = None;
    let mut weight_col = None;
    for row in rows.by_ref() {
        for (i, cell) in row.iter().enumerate() {
            if let Some(header) = cell_string(cell) {
                let header = header.to_lowercase();
                if header == "ticker" {
                    ticker_col = Some(i);
                } else if header.contains("weight") {
                    weight_col = Some(i);
                } else if header.contains("name") {
                    name_col = Some(i);
                }
            }
        }
        if ticker_col.is_some() {
            break;
        }
        name_col = None;
        weight_col = None;
    }
    let ticker_col = ticker_col.ok_or_else(|| {
        AppError::InvalidPayload(format!("{}: no ticker header in workbook", sector))
    })?;

    let mut holdings = Vec::new();
    for row in rows {
        let Some(ticker) = row.get(ticker_col).and_then(cell_string) else {
            continue;
        };
        let ticker = ticker.to_uppercase();
        if ticker.is_empty()
            || ticker == "-"
            || ticker.starts_with("CASH")
            || ticker.contains(char::is_whitespace)
        {
            continue;
        }

        let name = name_col
            .and_then(|i| row.get(i))
            .and_then(cell_string)
            .unwrap_or_default();
        let weight = weight_col
            .and_then(|i| row.get(i))
            .and_then(cell_number)
            .unwrap_or(0.0);

        holdings.push(Holding {
            ticker,
            name,
            weight,
        });
    }
    Ok(holdings)
}

fn cell_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn parse(rows: &[Vec<Data>]) -> Result<Vec<Holding>> {
        holdings_from_rows(rows.iter().map(|r| r.as_slice()), "XLK")
    }

    #[test]
    fn test_header_below_preamble() {
        let rows = vec![
            vec![s("Fund Name:"), s("Technology Select Sector SPDR Fund")],
            vec![s("Holdings:"), s("as of 22-Aug-2026")],
            vec![s("Name"), s("Ticker"), s("Weight")],
            vec![s("Apple Inc."), s("AAPL"), Data::Float(22.5)],
            vec![s("Microsoft Corp."), s("MSFT"), Data::Float(21.0)],
        ];
        let holdings = parse(&rows).unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].ticker, "AAPL");
        assert_eq!(holdings[0].name, "Apple Inc.");
        assert_eq!(holdings[0].weight, 22.5);
    }

    #[test]
    fn test_cash_and_placeholder_rows_skipped() {
        let rows = vec![
            vec![s("Name"), s("Ticker"), s("Weight")],
            vec![s("Apple Inc."), s("AAPL"), Data::Float(22.5)],
            vec![s("US Dollar"), s("CASH_USD"), Data::Float(0.2)],
            vec![s("Index Swap"), s("-"), Data::Float(0.1)],
            vec![s("Blank"), Data::Empty, Data::Float(0.1)],
        ];
        let holdings = parse(&rows).unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].ticker, "AAPL");
    }

    #[test]
    fn test_percent_string_weight() {
        let rows = vec![
            vec![s("Ticker"), s("Weight")],
            vec![s("NVDA"), s("20.10%")],
            vec![s("AVGO"), s(" 9.75 % ")],
        ];
        let holdings = parse(&rows).unwrap();
        assert_eq!(holdings[0].weight, 20.10);
        assert_eq!(holdings[1].weight, 9.75);
    }

    #[test]
    fn test_missing_header_errors() {
        let rows = vec![vec![s("nothing")], vec![s("useful")]];
        assert!(parse(&rows).is_err());
    }

    #[test]
    fn test_missing_weight_defaults_to_zero() {
        let rows = vec![vec![s("Ticker")], vec![s("AAPL")]];
        let holdings = parse(&rows).unwrap();
        assert_eq!(holdings[0].weight, 0.0);
        assert_eq!(holdings[0].name, "");
    }
}
