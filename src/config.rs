// DLC Core Library: lifecycle management & settlement of discreet log contracts
// Written in 2020 by
//     DLC Core Library contributors
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

use std::collections::BTreeSet;

use crate::CoinType;

/// Policy of a single party
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", default)
)]
pub struct PartyConfig {
    /// Coin types the party is able to fund and settle contracts in
    pub supported_coin_types: BTreeSet<CoinType>,
}

impl Default for PartyConfig {
    fn default() -> Self {
        PartyConfig {
            supported_coin_types: CoinType::all_known().into_iter().collect(),
        }
    }
}

impl PartyConfig {
    pub fn supports(&self, coin_type: CoinType) -> bool {
        self.supported_coin_types.contains(&coin_type)
    }
}
