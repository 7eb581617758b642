use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Ocean basin. Drives name pools and the basin/seasonal shear corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basin {
    NorthAtlantic,
    EastPacific,
    WestPacific,
    NorthIndian,
    Southern,
}

impl Basin {
    pub fn all() -> &'static [Basin] {
        &[
            Basin::NorthAtlantic,
            Basin::EastPacific,
            Basin::WestPacific,
            Basin::NorthIndian,
            Basin::Southern,
        ]
    }

    /// Rough basin lookup from a position (lon in degrees, either convention).
    pub fn containing(lon: f64, lat: f64) -> Basin {
        if lat < 0.0 {
            return Basin::Southern;
        }
        let lon = lon.rem_euclid(360.0);
        if (30.0..100.0).contains(&lon) {
            Basin::NorthIndian
        } else if (100.0..180.0).contains(&lon) {
            Basin::WestPacific
        } else if (180.0..262.0).contains(&lon) {
            Basin::EastPacific
        } else {
            Basin::NorthAtlantic
        }
    }

    /// Climatological shear bias in knots.
    pub fn shear_correction(self) -> f64 {
        match self {
            Basin::NorthAtlantic => 2.0,
            Basin::EastPacific => -1.0,
            Basin::WestPacific => -2.0,
            Basin::NorthIndian => 3.0,
            Basin::Southern => 0.0,
        }
    }

    pub fn peak_month(self) -> u32 {
        match self {
            Basin::NorthAtlantic => 9,
            Basin::EastPacific => 8,
            Basin::WestPacific => 8,
            Basin::NorthIndian => 10,
            Basin::Southern => 2,
        }
    }

    /// Extra shear in knots away from the basin's peak month: 0 at peak, 6 six months out.
    pub fn seasonal_shear_correction(self, month: u32) -> f64 {
        let offset = month as f64 - self.peak_month() as f64;
        let phase = offset * std::f64::consts::TAU / 12.0;
        3.0 * (1.0 - phase.cos())
    }

    /// A climatologically typical genesis point as (lon, lat).
    pub fn typical_genesis(self) -> (f64, f64) {
        match self {
            Basin::NorthAtlantic => (-45.0, 12.0),
            Basin::EastPacific => (-105.0, 13.0),
            Basin::WestPacific => (140.0, 12.0),
            Basin::NorthIndian => (88.0, 12.0),
            Basin::Southern => (80.0, -12.0),
        }
    }

    pub fn name_pool(self) -> &'static [&'static str] {
        match self {
            Basin::NorthAtlantic => &[
                "Alberto", "Beryl", "Chris", "Debby", "Ernesto", "Francine", "Gordon", "Helene",
                "Isaac", "Joyce", "Kirk", "Leslie", "Milton", "Nadine", "Oscar", "Patty",
                "Rafael", "Sara", "Tony", "Valerie", "William",
            ],
            Basin::EastPacific => &[
                "Aletta", "Bud", "Carlotta", "Daniel", "Emilia", "Fabio", "Gilma", "Hector",
                "Ileana", "John", "Kristy", "Lane", "Miriam", "Norman", "Olivia", "Paul",
                "Rosa", "Sergio", "Tara", "Vicente", "Willa", "Xavier", "Yolanda", "Zeke",
            ],
            Basin::WestPacific => &[
                "Ewiniar", "Maliksi", "Gaemi", "Prapiroon", "Maria", "Son-Tinh", "Ampil",
                "Wukong", "Jongdari", "Shanshan", "Yagi", "Leepi", "Bebinca", "Pulasan",
                "Soulik", "Cimaron", "Jebi", "Krathon", "Barijat", "Trami",
            ],
            Basin::NorthIndian => &[
                "Remal", "Asna", "Dana", "Fengal", "Shakhti", "Montha", "Senyar", "Ditwah",
            ],
            Basin::Southern => &[
                "Anggrek", "Bheki", "Chido", "Dikeledi", "Elvis", "Faida", "Garance", "Honde",
                "Ivone", "Jude",
            ],
        }
    }
}

const OVERFLOW_NAMES: &[&str] = &[
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota", "Kappa",
    "Lambda", "Mu", "Nu", "Xi", "Omicron", "Pi", "Rho", "Sigma", "Tau", "Upsilon", "Phi",
    "Chi", "Psi", "Omega",
];

/// Per-basin cursor into the name pools. Owned by the simulation, not by storms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameRegistry {
    next: HashMap<Basin, usize>,
}

impl NameRegistry {
    /// Take the next unused name for a basin. Falls back to the overflow list, then
    /// numbers the overflow names once that runs out too.
    pub fn next_name(&mut self, basin: Basin) -> String {
        let index = self.next.entry(basin).or_insert(0);
        let pool = basin.name_pool();
        let name = if *index < pool.len() {
            pool[*index].to_string()
        } else {
            let overflow = *index - pool.len();
            let base = OVERFLOW_NAMES[overflow % OVERFLOW_NAMES.len()];
            let round = overflow / OVERFLOW_NAMES.len();
            if round == 0 {
                base.to_string()
            } else {
                format!("{}-{}", base, round + 1)
            }
        };
        *index += 1;
        name
    }

    pub fn used(&self, basin: Basin) -> usize {
        self.next.get(&basin).copied().unwrap_or(0)
    }
}
