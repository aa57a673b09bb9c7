//! Policy maps: the learned table projected onto (delta_y, distance)
//!
//! Keys are grouped by the vertical offset between player and gap top and by
//! the horizontal distance to the next obstacle. Velocity is averaged out.
//! Absent action values count as 0.0, matching [`QTable::get`].

use std::{collections::BTreeMap, fmt, io::Write, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    q_learning::QTable,
    types::{Action, DiscreteKey},
};

/// Quantity plotted per cell of a policy map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMetric {
    /// Q(s, flap)
    QFlap,
    /// Q(s, noop)
    QNoop,
    /// max over both actions
    Value,
    /// 1.0 when flap is strictly better, else 0.0
    Policy,
}

impl PolicyMetric {
    pub const ALL: [PolicyMetric; 4] = [
        PolicyMetric::QFlap,
        PolicyMetric::QNoop,
        PolicyMetric::Value,
        PolicyMetric::Policy,
    ];
}

impl fmt::Display for PolicyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PolicyMetric::QFlap => "q_flap",
            PolicyMetric::QNoop => "q_noop",
            PolicyMetric::Value => "v",
            PolicyMetric::Policy => "pi",
        };
        f.write_str(label)
    }
}

impl FromStr for PolicyMetric {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q_flap" | "q-flap" | "flap" => Ok(PolicyMetric::QFlap),
            "q_noop" | "q-noop" | "noop" => Ok(PolicyMetric::QNoop),
            "v" | "value" => Ok(PolicyMetric::Value),
            "pi" | "policy" => Ok(PolicyMetric::Policy),
            _ => Err(Error::ParseMetric {
                input: s.to_string(),
                expected: "q_flap, q_noop, v, pi".to_string(),
            }),
        }
    }
}

/// Averages over every key sharing one (delta_y, distance) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyCell {
    pub delta_y: i16,
    pub distance: u8,
    pub q_flap: f64,
    pub q_noop: f64,
    pub v: f64,
    pub pi: f64,
    /// Number of keys averaged into this cell
    pub count: usize,
}

impl PolicyCell {
    pub fn metric(&self, metric: PolicyMetric) -> f64 {
        match metric {
            PolicyMetric::QFlap => self.q_flap,
            PolicyMetric::QNoop => self.q_noop,
            PolicyMetric::Value => self.v,
            PolicyMetric::Policy => self.pi,
        }
    }
}

#[derive(Default)]
struct CellSums {
    q_flap: f64,
    q_noop: f64,
    v: f64,
    pi: f64,
    count: usize,
}

/// Grid of [`PolicyCell`]s ordered by `(delta_y, distance)`.
///
/// # Examples
///
/// ```
/// use flappy::{
///     analysis::{PolicyMap, PolicyMetric},
///     q_learning::QTable,
///     types::{Action, DiscreteKey},
/// };
///
/// let mut table = QTable::new();
/// table.set(DiscreteKey::new(5, 3, 7, 0)?, Action::Flap, 1.5);
///
/// let map = PolicyMap::from_table(&table);
/// let cell = map.cell(2, 7).unwrap();
/// assert_eq!(cell.metric(PolicyMetric::Policy), 1.0);
/// # Ok::<(), flappy::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyMap {
    cells: BTreeMap<(i16, u8), PolicyCell>,
}

impl PolicyMap {
    /// Build the map from a read-only view of the table.
    pub fn from_table(table: &QTable) -> Self {
        let mut sums: BTreeMap<(i16, u8), CellSums> = BTreeMap::new();
        for (key, _) in table.iter() {
            let q_flap = table.get(key, Action::Flap);
            let q_noop = table.get(key, Action::NoOp);
            let sum = sums.entry(group_of(key)).or_default();
            sum.q_flap += q_flap;
            sum.q_noop += q_noop;
            sum.v += q_flap.max(q_noop);
            if q_flap > q_noop {
                sum.pi += 1.0;
            }
            sum.count += 1;
        }

        let cells = sums
            .into_iter()
            .map(|((delta_y, distance), sum)| {
                let n = sum.count as f64;
                let cell = PolicyCell {
                    delta_y,
                    distance,
                    q_flap: sum.q_flap / n,
                    q_noop: sum.q_noop / n,
                    v: sum.v / n,
                    pi: sum.pi / n,
                    count: sum.count,
                };
                ((delta_y, distance), cell)
            })
            .collect();
        Self { cells }
    }

    pub fn cell(&self, delta_y: i16, distance: u8) -> Option<&PolicyCell> {
        self.cells.get(&(delta_y, distance))
    }

    pub fn cells(&self) -> impl Iterator<Item = &PolicyCell> {
        self.cells.values()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Write every cell as one CSV record with a header row.
    pub fn write_cells<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for cell in self.cells() {
            csv.serialize(cell)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write one metric as a pivot table.
    ///
    /// Rows are delta_y values, columns are distances; cells with no keys
    /// are left empty.
    pub fn write_grid<W: Write>(&self, metric: PolicyMetric, writer: W) -> Result<()> {
        let mut distances: Vec<u8> = self.cells.keys().map(|&(_, d)| d).collect();
        distances.sort_unstable();
        distances.dedup();
        let mut rows: Vec<i16> = self.cells.keys().map(|&(dy, _)| dy).collect();
        rows.dedup();

        let mut csv = csv::Writer::from_writer(writer);
        let mut header = vec![format!("delta_y\\{metric}")];
        header.extend(distances.iter().map(u8::to_string));
        csv.write_record(&header)?;

        for delta_y in rows {
            let mut record = vec![delta_y.to_string()];
            record.extend(distances.iter().map(|&distance| {
                self.cell(delta_y, distance)
                    .map(|cell| cell.metric(metric).to_string())
                    .unwrap_or_default()
            }));
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }
}

fn group_of(key: &DiscreteKey) -> (i16, u8) {
    (key.delta_y(), key.distance)
}
