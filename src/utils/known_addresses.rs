//! Known-Entity Tables
//!
//! Static, read-only address labels. Infrastructure entries (bridges,
//! exchanges, mixers) mark terminals in funding trees so pooled hot wallets
//! are not flagged as Sybil funding hubs. Project entries label protocol
//! contracts a wallet interacted with.
//!
//! All keys are lowercase. Tables are built once and never mutated.

use std::collections::HashMap;

use crate::models::config::ChainId;
use crate::models::types::{EntityKind, ProjectCategory};

/// Labelled infrastructure address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownEntity {
    pub name: &'static str,
    pub kind: EntityKind,
    /// Finer grouping, e.g. `cex` or `dex`
    pub category: Option<&'static str>,
}

/// Labelled protocol contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownProject {
    pub name: &'static str,
    pub category: ProjectCategory,
}

const fn entity(name: &'static str, kind: EntityKind, category: Option<&'static str>) -> KnownEntity {
    KnownEntity { name, kind, category }
}

const fn project(name: &'static str, category: ProjectCategory) -> KnownProject {
    KnownProject { name, category }
}

lazy_static::lazy_static! {
    static ref KNOWN_ENTITIES: HashMap<ChainId, HashMap<&'static str, KnownEntity>> = {
        let mut tables = HashMap::new();

        tables.insert(ChainId::Ethereum, HashMap::from([
            ("0x00000000219ab540356cbb839cbe05303d7705fa", entity("Beacon Deposit Contract", EntityKind::Contract, None)),
            ("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", entity("WETH", EntityKind::Contract, None)),
            ("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", entity("Uniswap V2 Router", EntityKind::Contract, Some("dex"))),
            ("0x68b3465833fb72a70ecdf485e0e4c7bd8665fc45", entity("Uniswap V3 Router", EntityKind::Contract, Some("dex"))),
            ("0x12b66ca9ebf262c5700486c8f6114e9d038759e4", entity("Tornado Cash Proxy", EntityKind::Mixer, None)),
            ("0x722122df12d4e14e13ac3b6895a86e84145b6967", entity("Tornado Cash Router", EntityKind::Mixer, None)),
            ("0x28c6c06298d514db089934071355e5743bf21d60", entity("Binance 14", EntityKind::Exchange, Some("cex"))),
            ("0x21a31ee1afc51d94c2efccaa2092ad1028285549", entity("Binance 15", EntityKind::Exchange, Some("cex"))),
            ("0x71660c4005ba85c37ccec55d0c4493e66fe775d3", entity("Coinbase 1", EntityKind::Exchange, Some("cex"))),
            ("0x3154cf16ccdb4c6d922629664174b904d80f2c35", entity("Base Bridge", EntityKind::Bridge, Some("layer2"))),
            ("0x8315177ab297ba92a06054ce80a67ed4dbd7ed3a", entity("Arbitrum Bridge", EntityKind::Bridge, Some("layer2"))),
        ]));

        tables.insert(ChainId::Linea, HashMap::from([
            ("0x508ca82df566dcd1b0de8296e70a96313eda5665", entity("Linea Message Service", EntityKind::Bridge, Some("layer2"))),
        ]));

        tables.insert(ChainId::Arbitrum, HashMap::from([
            ("0x0000000000000000000000000000000000000064", entity("ArbSys", EntityKind::Contract, None)),
        ]));

        tables
    };

    static ref KNOWN_PROJECTS: HashMap<&'static str, KnownProject> = HashMap::from([
        ("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", project("Uniswap V2 Router", ProjectCategory::Defi)),
        ("0x68b3465833fb72a70ecdf485e0e4c7bd8665fc45", project("Uniswap V3 Router", ProjectCategory::Defi)),
        ("0xe592427a0aece92de3edee1f18e0157c05861564", project("Uniswap V3 Router", ProjectCategory::Defi)),
        ("0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad", project("Uniswap Universal Router", ProjectCategory::Defi)),
        ("0x1111111254eeb25477b68fb85ed929f73a960582", project("1inch Router", ProjectCategory::Defi)),
        ("0xdef1c0ded9bec7f1a1670819833240f027b25eff", project("0x Exchange Proxy", ProjectCategory::Defi)),
        ("0x881d40237659c251811cec9c364ef91dc08d300c", project("Metamask Swap", ProjectCategory::Defi)),
        ("0x00000000006c3852cbef3e08e8df289169ede581", project("OpenSea Seaport", ProjectCategory::Nft)),
        ("0x74312363e45dcaba76c59ec49a7aa8a65a67eed3", project("X2Y2", ProjectCategory::Nft)),
        ("0x59728544b08ab483533076417fbbb2fd0b17ce3a", project("LooksRare", ProjectCategory::Nft)),
    ]);
}

/// Infrastructure label for an address on a chain
pub fn lookup_entity(chain: ChainId, address: &str) -> Option<KnownEntity> {
    let key = address.to_lowercase();
    KNOWN_ENTITIES
        .get(&chain)
        .and_then(|table| table.get(key.as_str()))
        .copied()
}

/// Project label for a contract address (chain-agnostic)
pub fn lookup_project(address: &str) -> Option<KnownProject> {
    let key = address.to_lowercase();
    KNOWN_PROJECTS.get(key.as_str()).copied()
}

/// Bridge, exchange or mixer
pub fn is_infrastructure(chain: ChainId, address: &str) -> bool {
    lookup_entity(chain, address).is_some_and(|e| e.kind.is_infrastructure())
}

/// Known mixer
pub fn is_mixer(chain: ChainId, address: &str) -> bool {
    lookup_entity(chain, address).is_some_and(|e| e.kind == EntityKind::Mixer)
}

/// Any label at all, entity first
pub fn label_for(chain: ChainId, address: &str) -> Option<&'static str> {
    lookup_entity(chain, address)
        .map(|e| e.name)
        .or_else(|| lookup_project(address).map(|p| p.name))
}
