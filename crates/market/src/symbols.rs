/// Ticker → provider id translation for the assets we commonly watch.
/// Unknown tickers fall back to stripping the quote suffix and lowercasing,
/// which also lets callers pass a provider id straight through.
const SYMBOL_TO_ID: &[(&str, &str)] = &[
    ("BTCUSDT", "bitcoin"),
    ("ETHUSDT", "ethereum"),
    ("BNBUSDT", "binancecoin"),
    ("XRPUSDT", "ripple"),
    ("ADAUSDT", "cardano"),
    ("SOLUSDT", "solana"),
    ("DOGEUSDT", "dogecoin"),
    ("MATICUSDT", "matic-network"),
    ("DOTUSDT", "polkadot"),
    ("LTCUSDT", "litecoin"),
    ("LINKUSDT", "chainlink"),
    ("BCHUSDT", "bitcoin-cash"),
    ("ATOMUSDT", "cosmos"),
    ("AVAXUSDT", "avalanche-2"),
    ("XLMUSDT", "stellar"),
    ("FILUSDT", "filecoin"),
    ("TRXUSDT", "tron"),
    ("APTUSDT", "aptos"),
    ("INJUSDT", "injective-protocol"),
    ("ARBUSDT", "arbitrum"),
];

pub fn provider_id(symbol_or_id: &str) -> String {
    let s = symbol_or_id.trim();
    SYMBOL_TO_ID
        .iter()
        .find(|(sym, _)| *sym == s)
        .map(|(_, id)| (*id).to_string())
        .unwrap_or_else(|| s.replace("USDT", "").to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tickers_map_to_provider_ids() {
        assert_eq!(provider_id("BTCUSDT"), "bitcoin");
        assert_eq!(provider_id("AVAXUSDT"), "avalanche-2");
    }

    #[test]
    fn unknown_tickers_strip_suffix_and_lowercase() {
        assert_eq!(provider_id("PEPEUSDT"), "pepe");
        assert_eq!(provider_id("  NEARUSDT "), "near");
    }

    #[test]
    fn provider_ids_pass_through() {
        assert_eq!(provider_id("bitcoin"), "bitcoin");
    }
}
