#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::pedantic)]
#![allow(clippy::unwrap_used)]
#![allow(warnings)]

use plotters::prelude::*;
use rand::Rng;

// Simulation parameters
const TABLE_SIZE: usize = 1 << 16;
// Create load factors from 0.1 to 0.85 with 10 steps
const NUM_LOAD_FACTORS: usize = 10;
// Number of remove/insert cycles applied before measuring
const CHURN_FACTOR: usize = 4;

// Deletion strategies to compare
const METHODS: [&str; 2] = ["Tombstone", "Backward Shift"];

// One slot of the simulated table
#[derive(Clone, Copy, PartialEq)]
enum Cell {
    Empty,
    Key(u64),
    Dead,
}

// Keys act as their own hash codes in this simulation
fn home(key: u64) -> usize {
    (key as usize) & (TABLE_SIZE - 1)
}

// Linear-probing insertion; tombstones are reclaimed when the run ends empty.
// A table saturated with markers has no empty slot left, so the walk is
// bounded to one full cycle before falling back to the first marker.
fn insert(table: &mut Vec<Cell>, key: u64) {
    let mut index = home(key);
    let mut first_dead = None;

    for _ in 0..TABLE_SIZE {
        match table[index] {
            Cell::Empty => {
                table[first_dead.unwrap_or(index)] = Cell::Key(key);
                return;
            }
            Cell::Dead => {
                if first_dead.is_none() {
                    first_dead = Some(index);
                }
            }
            Cell::Key(existing) if existing == key => return,
            Cell::Key(_) => {}
        }
        index = (index + 1) & (TABLE_SIZE - 1);
    }

    if let Some(dead) = first_dead {
        table[dead] = Cell::Key(key);
    }
}

// Number of slots inspected before the lookup resolves
fn lookup_probes(table: &Vec<Cell>, key: u64) -> usize {
    let mut index = home(key);
    let mut probes = 1;

    for _ in 0..TABLE_SIZE {
        match table[index] {
            Cell::Empty => return probes,
            Cell::Key(existing) if existing == key => return probes,
            _ => {}
        }
        index = (index + 1) & (TABLE_SIZE - 1);
        probes += 1;
    }

    probes
}

// Standard open-addressing removal: mark the slot dead
fn remove_tombstone(table: &mut Vec<Cell>, key: u64) {
    let mut index = home(key);

    for _ in 0..TABLE_SIZE {
        match table[index] {
            Cell::Empty => return,
            Cell::Key(existing) if existing == key => {
                table[index] = Cell::Dead;
                return;
            }
            _ => {}
        }
        index = (index + 1) & (TABLE_SIZE - 1);
    }
}

// Tombstone-free removal: shift the rest of the run backward over the gap
fn remove_backward_shift(table: &mut Vec<Cell>, key: u64) {
    let mut index = home(key);

    loop {
        match table[index] {
            Cell::Empty => return,
            Cell::Key(existing) if existing == key => break,
            _ => {}
        }
        index = (index + 1) & (TABLE_SIZE - 1);
    }

    let mut gap = index;
    let mut current = (index + 1) & (TABLE_SIZE - 1);
    while let Cell::Key(occupant) = table[current] {
        let ideal = home(occupant);
        // The occupant may only move back if its home keeps the gap on its
        // probe path; the two arms cover the wrapped and unwrapped interval.
        let in_range = if gap < current {
            gap < ideal && ideal <= current
        } else {
            gap < ideal || ideal <= current
        };
        if !in_range {
            table[gap] = Cell::Key(occupant);
            gap = current;
        }
        current = (current + 1) & (TABLE_SIZE - 1);
    }
    table[gap] = Cell::Empty;
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate load factors from 0.1 to 0.85
    let load_factors: Vec<f64> = (0..NUM_LOAD_FACTORS)
        .map(|i| 0.1 + (0.85 - 0.1) * (i as f64) / ((NUM_LOAD_FACTORS - 1) as f64))
        .collect();

    let num_keys: Vec<usize> =
        load_factors.iter().map(|&load| (TABLE_SIZE as f64 * load) as usize).collect();

    println!("Load factors: {:?}", load_factors);
    println!("Number of keys: {:?}", num_keys);

    let mut average_probes: Vec<Vec<f64>> = vec![Vec::new(); METHODS.len()];

    let mut rng = rand::rng();

    for &n_keys in &num_keys {
        println!("Testing with {} keys", n_keys);

        for (method_idx, &method) in METHODS.iter().enumerate() {
            let mut table: Vec<Cell> = vec![Cell::Empty; TABLE_SIZE];
            let mut live: Vec<u64> = Vec::with_capacity(n_keys);

            while live.len() < n_keys {
                let key: u64 = rng.random();
                insert(&mut table, key);
                live.push(key);
            }

            // Sustained churn: every cycle removes one random key and inserts
            // a fresh one, keeping the load factor steady. This is where the
            // two strategies drift apart: markers pile up, shifted tables
            // stay clean.
            for _ in 0..n_keys * CHURN_FACTOR {
                let victim_idx = rng.random_range(0..live.len());
                let victim = live.swap_remove(victim_idx);
                match method {
                    "Tombstone" => remove_tombstone(&mut table, victim),
                    "Backward Shift" => remove_backward_shift(&mut table, victim),
                    _ => return Ok(()),
                }
                let replacement: u64 = rng.random();
                insert(&mut table, replacement);
                live.push(replacement);
            }

            let total: usize = live.iter().map(|&key| lookup_probes(&table, key)).sum();
            let avg = total as f64 / live.len() as f64;
            average_probes[method_idx].push(avg);

            println!("  {}: Avg probes = {:.2}", method, avg);
        }
    }

    // Plot the comparison
    let font_family = "sans-serif";
    let colors = [
        RGBColor(220, 50, 50), // Bright red
        RGBColor(50, 90, 220), // Bright blue
    ];
    let line_width = 2;
    let marker_size = 4;
    let text_size = 16;
    let title_size = 30;

    let root = BitMapBackend::new("probe_stats.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_avg = average_probes
        .iter()
        .flat_map(|v| v.iter())
        .fold(0.0, |max, &x| if x > max { x } else { max }) *
        1.1; // Add 10% margin

    let mut chart = ChartBuilder::on(&root)
        .caption("Lookup Cost After Churn: Tombstone vs Backward Shift", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0_f64, 0.0..max_avg)?;

    chart
        .configure_mesh()
        .x_desc("Load Factor")
        .y_desc("Average Lookup Probes")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    for (method_idx, &method) in METHODS.iter().enumerate() {
        let color = &colors[method_idx % colors.len()];
        let line_style = ShapeStyle::from(color).stroke_width(line_width);

        chart
            .draw_series(LineSeries::new(
                load_factors.iter().zip(&average_probes[method_idx]).map(|(&x, &y)| (x, y)),
                line_style,
            ))?
            .label(method)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series(
            load_factors
                .iter()
                .zip(&average_probes[method_idx])
                .map(|(&x, &y)| Circle::new((x, y), marker_size, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    println!("Wrote probe_stats.png");

    Ok(())
}
