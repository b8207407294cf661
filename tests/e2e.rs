//! End-to-end scenarios spanning both AFS and GigaMap.

use std::sync::Arc;

use nebulastore::afs::{FragmentedFileSystem, MemoryConnector};
use nebulastore::gigamap::{FieldIndexer, GigaMap};
use nebulastore::{ObjectStorer, RootObject};

#[derive(Clone, Debug, PartialEq)]
struct Catalog {
    name: String,
    item_count: i64,
}

#[test]
fn root_object_and_object_pages_survive_a_round_trip() {
    let fs = Arc::new(FragmentedFileSystem::new(Arc::new(MemoryConnector::default()), 4096));
    let storer = ObjectStorer::new(fs);

    assert_eq!(storer.load_root().unwrap(), None);

    let root = RootObject { type_name: "nebulastore.Catalog".to_string(), data: vec![9, 8, 7] };
    storer.save_root(&root).unwrap();
    assert_eq!(storer.load_root().unwrap(), Some(root));

    storer.save_object(1, b"first entity page").unwrap();
    storer.save_object(2, b"second entity page").unwrap();
    assert_eq!(storer.load_object(1).unwrap(), b"first entity page");
    assert_eq!(storer.load_object(2).unwrap(), b"second entity page");
    assert!(!storer.has_object(3).unwrap());
}

#[test]
fn gigamap_indexes_entities_whose_pages_live_in_afs() {
    let fs = Arc::new(FragmentedFileSystem::new(Arc::new(MemoryConnector::default()), 4096));
    let storer = ObjectStorer::new(fs);

    let map = GigaMap::new();
    map.register_unique_index(Box::new(FieldIndexer::property("name", |c: &Catalog| c.name.clone())))
        .unwrap();

    let catalogs = [
        Catalog { name: "books".to_string(), item_count: 120 },
        Catalog { name: "films".to_string(), item_count: 45 },
    ];

    for catalog in &catalogs {
        let id = map.add(catalog.clone()).unwrap();
        let page = format!("{}:{}", catalog.name, catalog.item_count);
        storer.save_object(id, page.as_bytes()).unwrap();
    }

    for id in map.ids() {
        let catalog = map.get(id).unwrap();
        let page = storer.load_object(id).unwrap();
        assert_eq!(page, format!("{}:{}", catalog.name, catalog.item_count).as_bytes());
    }

    let duplicate = map.add(Catalog { name: "books".to_string(), item_count: 1 });
    assert!(duplicate.is_err());
}
