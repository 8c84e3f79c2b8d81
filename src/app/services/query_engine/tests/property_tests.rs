//! Property-based tests for extents and pagination

use super::*;
use crate::app::models::{Collection, Item};
use crate::app::services::query_engine::{QueryFilter, SortDirection, SortKey};
use proptest::prelude::*;

fn arb_item() -> impl Strategy<Value = (f64, f64, f64, f64, u32, u32)> {
    (
        -170.0f64..170.0,
        -80.0f64..80.0,
        0.0f64..10.0,
        0.0f64..10.0,
        0u32..1_000_000,
        0u32..100_000,
    )
}

fn build_item(n: usize, spec: (f64, f64, f64, f64, u32, u32)) -> Item {
    let (x, y, w, h, start_offset, length) = spec;
    let start = ts("2020-01-01") + chrono::Duration::minutes(start_offset as i64);
    let end = start + chrono::Duration::minutes(length as i64);
    Item::from_spec(
        ItemSpec::new(format!("item-{}", n))
            .with_geometry(bbox([x, y, x + w, y + h]).to_polygon())
            .with_time(ItemTime::range(start, end).unwrap()),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_extent_is_insertion_order_independent(
        specs in prop::collection::vec(arb_item(), 1..40),
        seed in any::<u64>(),
    ) {
        let items: Vec<Item> = specs.iter().enumerate().map(|(n, s)| build_item(n, *s)).collect();

        let mut forward = Collection::from_spec(CollectionSpec::new("forward")).unwrap();
        for item in items.iter().cloned() {
            forward.add_item(item).unwrap();
        }

        // Deterministic shuffle driven by the seed
        let mut shuffled = items.clone();
        let mut state = seed | 1;
        for i in (1..shuffled.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            shuffled.swap(i, (state % (i as u64 + 1)) as usize);
        }

        let mut permuted = Collection::from_spec(CollectionSpec::new("permuted")).unwrap();
        for item in shuffled {
            permuted.add_item(item).unwrap();
        }

        prop_assert_eq!(forward.spatial_extent(), permuted.spatial_extent());
        prop_assert_eq!(forward.temporal_extent(), permuted.temporal_extent());

        let envelope = items
            .iter()
            .filter_map(|item| item.geometry.as_ref().and_then(|g| g.bbox()))
            .reduce(|a, b| a.union(&b));
        prop_assert_eq!(forward.spatial_extent(), envelope);

        let earliest = items.iter().filter_map(|i| i.time).map(|t| t.start()).min();
        let latest = items.iter().filter_map(|i| i.time).map(|t| t.end()).max();
        prop_assert_eq!(forward.temporal_extent().start, earliest);
        prop_assert_eq!(forward.temporal_extent().end, latest);
    }

    #[test]
    fn prop_pagination_visits_every_match_once(
        specs in prop::collection::vec(arb_item(), 0..60),
        limit in 1usize..15,
        by_datetime in any::<bool>(),
        descending in any::<bool>(),
    ) {
        let catalog = Catalog::in_memory(CatalogConfig::default()).unwrap();
        catalog.create_collection(CollectionSpec::new("a")).unwrap();
        catalog.create_collection(CollectionSpec::new("b")).unwrap();
        for (n, spec) in specs.iter().enumerate() {
            let collection = if n % 3 == 0 { "b" } else { "a" };
            let item = build_item(n, *spec);
            let mut item_spec = ItemSpec::new(item.id().to_string());
            item_spec.geometry = item.geometry.clone();
            item_spec.time = item.time;
            catalog.create_item(collection, item_spec).unwrap();
        }

        let sort = if by_datetime { SortKey::Datetime } else { SortKey::Id };
        let direction = if descending { SortDirection::Desc } else { SortDirection::Asc };
        let base = QueryFilter::new().sorted_by(sort, direction);

        let full = catalog.query(&base.clone().with_limit(1_000)).unwrap();
        prop_assert_eq!(full.len(), specs.len());

        let mut paged = Vec::new();
        let mut filter = base.with_limit(limit);
        loop {
            let page = catalog.query(&filter).unwrap();
            prop_assert!(page.len() <= limit);
            prop_assert_eq!(page.number_matched, specs.len());
            paged.extend(ids(&page));
            match page.next_cursor {
                Some(cursor) => filter.cursor = Some(cursor),
                None => break,
            }
        }

        prop_assert_eq!(paged, ids(&full));
    }
}
