use easybook::derivation::{filtered_entities, selected_medicines_view, tests_total};
use easybook::{
    reset, BookingKind, CatalogProvider, Entity, InMemoryCatalog, Medicine, Selection, SubItem,
    TimeGrid, Wizard, WizardAction,
};
use proptest::prelude::*;
use proptest::sample::{select, Index};

/// Every action the demo catalog makes possible, plus a few invalid ones.
fn action_pool(catalog: &InMemoryCatalog) -> Vec<WizardAction> {
    let mut pool = vec![
        WizardAction::GoBack,
        WizardAction::GoBack,
        WizardAction::Reset,
        WizardAction::SetSearchTerm("a".into()),
        WizardAction::SetSearchTerm(String::new()),
        WizardAction::SelectTimeSlot("10:00 AM".into()),
        WizardAction::SelectTimeSlot("03:00 PM".into()),
        WizardAction::SelectTimeSlot("not a time".into()),
    ];

    for kind in BookingKind::ALL {
        pool.push(WizardAction::ChangeKind(kind));
        for entity in catalog.list_entities(kind) {
            if let Entity::Doctor(d) = &entity {
                pool.push(WizardAction::SelectDoctor(d.clone()));
            }
            for item in catalog.list_sub_items(kind, entity.id()) {
                match item {
                    SubItem::Doctor(d) => pool.push(WizardAction::SelectDoctor(d)),
                    SubItem::Medicine(m) => {
                        for delta in [2, -3] {
                            pool.push(WizardAction::SetMedicineQuantity {
                                medicine_id: m.id.clone(),
                                delta,
                            });
                        }
                        pool.push(WizardAction::ToggleMedicine(m));
                    }
                    SubItem::Test(t) => pool.push(WizardAction::ToggleTest(t)),
                }
            }
            pool.push(WizardAction::SelectEntity(entity));
        }
    }
    pool
}

fn run(wizard: &Wizard<&InMemoryCatalog>, kind: BookingKind, pool: &[WizardAction], picks: &[Index]) -> Vec<Selection> {
    let mut states = vec![reset(kind)];
    for pick in picks {
        let next = wizard.apply(states.last().unwrap(), pick.get(pool).clone());
        states.push(next);
    }
    states
}

fn medplus_stock(catalog: &InMemoryCatalog) -> Vec<Medicine> {
    catalog
        .list_sub_items(BookingKind::Pharmacy, "p1")
        .into_iter()
        .filter_map(|item| match item {
            SubItem::Medicine(m) => Some(m),
            _ => None,
        })
        .collect()
}

fn kind_strategy() -> impl Strategy<Value = BookingKind> {
    select(BookingKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn step_stays_within_kind_bounds(
        kind in kind_strategy(),
        picks in prop::collection::vec(any::<Index>(), 0..60),
    ) {
        let catalog = InMemoryCatalog::demo();
        let wizard = Wizard::new(&catalog, TimeGrid::default());
        let pool = action_pool(&catalog);

        for s in run(&wizard, kind, &pool, &picks) {
            prop_assert!(s.step() >= 1);
            prop_assert!(s.step() <= s.kind().max_step());
        }
    }

    #[test]
    fn chosen_items_belong_to_chosen_entity(
        kind in kind_strategy(),
        picks in prop::collection::vec(any::<Index>(), 0..60),
    ) {
        let catalog = InMemoryCatalog::demo();
        let wizard = Wizard::new(&catalog, TimeGrid::default());
        let pool = action_pool(&catalog);

        for s in run(&wizard, kind, &pool, &picks) {
            let Some(entity) = s.chosen_entity() else {
                prop_assert!(s.chosen_medicines().is_empty());
                prop_assert!(s.chosen_tests().is_empty());
                prop_assert!(s.chosen_doctor().is_none());
                continue;
            };
            prop_assert_eq!(entity.kind(), s.kind());

            let offered: Vec<String> = catalog
                .list_sub_items(s.kind(), entity.id())
                .iter()
                .map(|i| i.id().to_string())
                .collect();
            for id in s.chosen_medicines().keys().chain(s.chosen_tests().keys()) {
                prop_assert!(offered.contains(id));
            }
            if let (BookingKind::Hospital, Some(doctor)) = (s.kind(), s.chosen_doctor()) {
                prop_assert_eq!(doctor.hospital_id.as_deref(), Some(entity.id()));
            }
            for chosen in s.chosen_medicines().values() {
                prop_assert!(chosen.quantity >= 1);
            }
        }
    }

    #[test]
    fn medicine_quantity_never_below_one(
        deltas in prop::collection::vec(prop_oneof![-5i32..5, Just(i32::MIN), Just(i32::MAX)], 1..30),
    ) {
        let catalog = InMemoryCatalog::demo();
        let wizard = Wizard::new(&catalog, TimeGrid::default());
        let medplus = catalog.find_entity(BookingKind::Pharmacy, "p1").unwrap();
        let para = medplus_stock(&catalog).remove(0);

        let mut s = wizard.select_entity(&reset(BookingKind::Pharmacy), &medplus);
        s = wizard.toggle_medicine(&s, &para);
        for delta in deltas {
            s = wizard.set_medicine_quantity(&s, &para.id, delta);
            prop_assert!(s.medicine_quantity(&para.id).unwrap() >= 1);
        }
    }

    #[test]
    fn double_toggle_restores_selection(
        preselected in prop::collection::vec(any::<bool>(), 3),
        target in 0usize..3,
        bumps in 0i32..4,
    ) {
        let catalog = InMemoryCatalog::demo();
        let wizard = Wizard::new(&catalog, TimeGrid::default());
        let medplus = catalog.find_entity(BookingKind::Pharmacy, "p1").unwrap();
        let stock = medplus_stock(&catalog);

        let mut s = wizard.select_entity(&reset(BookingKind::Pharmacy), &medplus);
        for (medicine, chosen) in stock.iter().zip(&preselected) {
            if *chosen {
                s = wizard.toggle_medicine(&s, medicine);
                s = wizard.set_medicine_quantity(&s, &medicine.id, bumps);
            }
        }

        let x = &stock[target];
        let round_trip = wizard.toggle_medicine(&wizard.toggle_medicine(&s, x), x);
        if preselected[target] {
            // removal then re-insert resets the quantity
            prop_assert_eq!(round_trip.medicine_quantity(&x.id), Some(1));
            prop_assert_eq!(round_trip.chosen_medicines().len(), s.chosen_medicines().len());
        } else {
            prop_assert_eq!(round_trip, s);
        }
    }

    #[test]
    fn derivations_are_pure(
        kind in kind_strategy(),
        term in "[a-zA-Z ]{0,6}",
        picks in prop::collection::vec(any::<Index>(), 0..30),
    ) {
        let catalog = InMemoryCatalog::demo();
        let wizard = Wizard::new(&catalog, TimeGrid::default());
        let pool = action_pool(&catalog);
        let s = run(&wizard, kind, &pool, &picks).pop().unwrap();

        let snapshot = s.clone();
        let listed = catalog.list_entities(kind);

        prop_assert_eq!(filtered_entities(&catalog, kind, &term), filtered_entities(&catalog, kind, &term));
        prop_assert_eq!(selected_medicines_view(&s), selected_medicines_view(&s));
        prop_assert_eq!(tests_total(&s), tests_total(&s));

        prop_assert_eq!(s, snapshot);
        prop_assert_eq!(catalog.list_entities(kind), listed);
    }
}
