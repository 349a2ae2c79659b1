//! # probemap
//!
//! Associative arrays built on open addressing.
//!
//! This crate provides two map implementations:
//!
//! - [`OpenMap`]: a linear-probing hash map with a pluggable deletion
//!   strategy. The default [`BackwardShift`] policy closes the gap a removal
//!   leaves by shifting colliding entries backward, so the table never
//!   accumulates tombstones and lookups never slow down after deletions.
//!   [`Tombstone`] provides the classic marker-based behavior for contrast.
//! - [`PerfectMap`]: a static two-level perfect-hash map for key sets known
//!   ahead of time. A primary universal hash function partitions the keys
//!   into buckets and every bucket draws its own collision-free secondary
//!   function, giving worst-case O(1) lookups with zero collisions.
//!
//! ## Basic Usage
//!
//! ```rust
//! use probemap::OpenMap;
//!
//! // Create a new hash map
//! let mut map = OpenMap::new();
//!
//! // Insert values
//! map.insert("apple".to_string(), 1);
//! map.insert("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(map.get("apple"), Some(&1));
//!
//! // Update values
//! map.insert("apple".to_string(), 10);
//! assert_eq!(map.get("apple"), Some(&10));
//!
//! // Remove values without leaving a marker behind
//! map.remove("apple");
//! assert_eq!(map.get("apple"), None);
//! ```
//!
//! ## Perfect Hashing
//!
//! ```rust
//! use probemap::PerfectMap;
//!
//! // The full key set is supplied up front; the structure never resizes.
//! let mut map = PerfectMap::from_entries(vec![
//!     ("red", 0xff0000),
//!     ("green", 0x00ff00),
//!     ("blue", 0x0000ff),
//! ])
//! .unwrap();
//!
//! assert_eq!(map.get(&"green"), Some(&0x00ff00));
//! assert!(!map.contains_key(&"magenta"));
//!
//! // Updates are allowed for keys from the construction set.
//! map.put("red", 0x800000);
//! assert_eq!(map.get(&"red"), Some(&0x800000));
//! ```

/// Universal hash family and the mask/prime searches behind the perfect map
mod hash;
/// Module implementing the linear-probing open-addressing hash map
mod open_map;
/// Module implementing the static two-level perfect-hash map
mod perfect;
/// Deletion strategies for the open-addressing hash map
mod policy;
/// Utility functions and traits for the maps
mod utils;

pub use open_map::{Iter, OpenMap};
pub use perfect::{BuildError, Keys, PerfectMap};
pub use policy::{BackwardShift, DeletionPolicy, Tombstone};
pub use utils::MapExtensions;
