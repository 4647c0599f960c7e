use super::*;

fn img(tag: u8) -> ImageHandle {
    ImageHandle::new(vec![tag])
}

#[test]
fn first_version_starts_current() {
    let a = img(1);
    let store = SceneVersionStore::new(vec![vec![a.clone(), img(2)]]).unwrap();
    assert_eq!(store.current(0).unwrap(), a);
    assert_eq!(store.current_version(0).unwrap(), 0);
}

#[test]
fn empty_scene_is_rejected() {
    assert!(SceneVersionStore::new(vec![vec![img(1)], vec![]]).is_err());
}

#[test]
fn append_grows_by_one_and_becomes_current() {
    let store = SceneVersionStore::new(vec![vec![img(1)], vec![img(2)]]).unwrap();
    let before = store.history_of(1).unwrap();
    let new = store.append(1, img(3)).unwrap();

    let after = store.history_of(1).unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], before.as_slice());
    assert_eq!(store.current(1).unwrap(), new);
    assert_eq!(store.history_of(0).unwrap().len(), 1);
}

#[test]
fn select_moves_only_the_pointer() {
    let (a, b) = (img(1), img(2));
    let store = SceneVersionStore::new(vec![vec![a.clone(), b.clone()]]).unwrap();
    store.select(0, 1).unwrap();
    assert_eq!(store.current(0).unwrap(), b);
    store.select(0, 0).unwrap();
    assert_eq!(store.current(0).unwrap(), a);
    assert_eq!(store.history_of(0).unwrap(), vec![a, b]);
}

#[test]
fn select_out_of_range_keeps_current() {
    let (a, b) = (img(1), img(2));
    let store = SceneVersionStore::new(vec![vec![a, b.clone()]]).unwrap();
    store.select(0, 1).unwrap();

    let err = store.select(0, 5).unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::InvalidVersionIndex {
            scene: 0,
            version: 5,
            len: 2
        }
    ));
    assert_eq!(store.current(0).unwrap(), b);
}

#[test]
fn unknown_scene_is_out_of_range() {
    let store = SceneVersionStore::new(vec![vec![img(1)]]).unwrap();
    assert!(matches!(
        store.append(3, img(2)),
        Err(AssemblyError::SceneOutOfRange { scene: 3, count: 1 })
    ));
    assert!(store.history_of(1).is_err());
}

#[test]
fn concurrent_appends_lose_nothing() {
    let store = std::sync::Arc::new(
        SceneVersionStore::new(vec![vec![img(0)], vec![img(0)]]).unwrap(),
    );
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    store.append(i % 2, img(1)).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(store.history_of(0).unwrap().len(), 1 + 100);
    assert_eq!(store.history_of(1).unwrap().len(), 1 + 100);
    assert_eq!(store.current_version(0).unwrap(), 100);
}
