/// Integration tests for buying, selling and equipping through the command layer
mod common;

use questforge::game::{
    CharacterClass, CharacterPatch, EntityStore, GameError, Item, ValidationError,
};

async fn seed_gold(store: &impl EntityStore, user: &str, gold: u64) {
    store
        .update_character(user, &CharacterPatch::gold(gold))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_buy_with_insufficient_gold_changes_nothing() {
    let (_tmp, service) = common::sled_service();
    service
        .create_character("alice", "Alice", CharacterClass::Novice)
        .await
        .unwrap();
    seed_gold(service.store().as_ref(), "alice", 10).await;

    let err = service
        .buy_item("alice", Item::new("shield", "Shield", 50))
        .await
        .unwrap_err();
    assert_eq!(
        match err {
            GameError::Validation(v) => v,
            other => panic!("unexpected {:?}", other),
        },
        ValidationError::InsufficientGold {
            needed: 50,
            available: 10
        }
    );
    assert_eq!(service.character("alice").await.unwrap().gold, 10);
    assert!(service.inventory("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_buy_stacks_and_deducts() {
    let (_tmp, service) = common::sled_service();
    service
        .create_character("bob", "Bob", CharacterClass::Novice)
        .await
        .unwrap();
    seed_gold(service.store().as_ref(), "bob", 100).await;

    service
        .buy_item("bob", Item::stackable("potion", "Health Potion", 20, 3))
        .await
        .unwrap();
    let (bob, items) = service
        .buy_item("bob", Item::stackable("potion", "Health Potion", 20, 2))
        .await
        .unwrap();

    assert_eq!(bob.gold, 60);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, Some(5));
    assert_eq!(service.inventory("bob").await.unwrap(), items);
}

#[tokio::test]
async fn test_sell_credits_half_rounded_down() {
    let (_tmp, service) = common::sled_service();
    service
        .create_character("carol", "Carol", CharacterClass::Novice)
        .await
        .unwrap();
    seed_gold(service.store().as_ref(), "carol", 99).await;
    service
        .buy_item("carol", Item::new("gem", "Odd Gem", 99))
        .await
        .unwrap();

    let (carol, items) = service.sell_item("carol", "gem").await.unwrap();
    assert_eq!(carol.gold, 49);
    assert!(items.is_empty());

    let err = service.sell_item("carol", "gem").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(service.character("carol").await.unwrap().gold, 49);
}

#[tokio::test]
async fn test_equip_and_unequip_persist() {
    let (_tmp, service) = common::sled_service();
    service
        .create_character("dave", "Dave", CharacterClass::Fighter)
        .await
        .unwrap();
    seed_gold(service.store().as_ref(), "dave", 200).await;
    service
        .buy_item("dave", Item::equippable("sword", "Iron Sword", 50))
        .await
        .unwrap();
    service
        .buy_item("dave", Item::equippable("helm", "Iron Helm", 40))
        .await
        .unwrap();

    service.equip_item("dave", "sword").await.unwrap();
    service.equip_item("dave", "helm").await.unwrap();
    let items = service.inventory("dave").await.unwrap();
    assert!(items.iter().all(|i| i.equipped()));

    let items = service.unequip_item("dave", "sword").await.unwrap();
    assert_eq!(items[0].is_equipped, Some(false));
    assert!(service
        .equip_item("dave", "axe")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_inventory_failure_restores_gold() {
    let (_tmp, flaky, service) = common::flaky_service();
    service
        .create_character("erin", "Erin", CharacterClass::Novice)
        .await
        .unwrap();
    seed_gold(flaky.as_ref(), "erin", 80).await;

    flaky.fail_inventory(true);
    let err = service
        .buy_item("erin", Item::new("lamp", "Lamp", 30))
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Store(_)));
    assert_eq!(service.character("erin").await.unwrap().gold, 80);

    flaky.fail_inventory(false);
    let (erin, _) = service
        .buy_item("erin", Item::new("lamp", "Lamp", 30))
        .await
        .unwrap();
    assert_eq!(erin.gold, 50);
}

#[tokio::test]
async fn test_character_write_failure_leaves_inventory() {
    let (_tmp, flaky, service) = common::flaky_service();
    service
        .create_character("fay", "Fay", CharacterClass::Novice)
        .await
        .unwrap();
    seed_gold(flaky.as_ref(), "fay", 80).await;
    service
        .buy_item("fay", Item::new("lamp", "Lamp", 30))
        .await
        .unwrap();

    flaky.fail_character_after(0);
    assert!(service.sell_item("fay", "lamp").await.is_err());
    flaky.fail_character_after(usize::MAX);

    assert_eq!(service.character("fay").await.unwrap().gold, 50);
    assert_eq!(service.inventory("fay").await.unwrap().len(), 1);
}
