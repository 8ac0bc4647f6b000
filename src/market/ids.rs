//! Coin ids across providers
//!
//! CoinGecko ids are canonical. CoinCap and CoinPaprika name some coins
//! differently, so requests are translated out of CoinGecko ids and
//! normalized results are translated back through the same table. Ids the
//! table does not know pass through unchanged.

/// `(coingecko, coincap, coinpaprika)` for the coins the dashboard tracks
const KNOWN_COINS: &[(&str, &str, &str)] = &[
    ("bitcoin", "bitcoin", "btc-bitcoin"),
    ("ethereum", "ethereum", "eth-ethereum"),
    ("tether", "tether", "usdt-tether"),
    ("usd-coin", "usd-coin", "usdc-usd-coin"),
    ("binancecoin", "binance-coin", "bnb-binance-coin"),
    ("solana", "solana", "sol-solana"),
    ("dogecoin", "dogecoin", "doge-dogecoin"),
    ("dai", "multi-collateral-dai", "dai-dai"),
    ("chainlink", "chainlink", "link-chainlink"),
    ("uniswap", "uniswap", "uni-uniswap"),
];

/// CoinCap asset id for a CoinGecko id
pub fn coincap_id(coin_id: &str) -> &str {
    KNOWN_COINS
        .iter()
        .find(|(gecko, _, _)| *gecko == coin_id)
        .map_or(coin_id, |&(_, cap, _)| cap)
}

/// CoinPaprika id for a CoinGecko id, if the coin is tracked
pub fn paprika_id(coin_id: &str) -> Option<&'static str> {
    KNOWN_COINS
        .iter()
        .find(|(gecko, _, _)| *gecko == coin_id)
        .map(|&(_, _, paprika)| paprika)
}

/// CoinGecko id for a CoinCap asset id
pub fn coin_id_from_coincap(id: &str) -> &str {
    KNOWN_COINS
        .iter()
        .find(|(_, cap, _)| *cap == id)
        .map_or(id, |&(gecko, _, _)| gecko)
}

/// CoinGecko id for a CoinPaprika id
pub fn coin_id_from_paprika(id: &str) -> &str {
    KNOWN_COINS
        .iter()
        .find(|(_, _, paprika)| *paprika == id)
        .map_or(id, |&(gecko, _, _)| gecko)
}
