//! Command-line front end for the booking wizard.
//!
//! `easybook demo` books one of each kind against the built-in catalog;
//! `easybook interactive` walks through the wizard over stdin.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use easybook::derivation::{self, Listing};
use easybook::models::format_price;
use easybook::{
    AppConfig, BookingKind, CatalogProvider, Entity, InMemoryCatalog, InMemorySubmitter,
    SelectionStore, SubItem, TimeGrid, WizardAction,
};
use std::io::{self, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "easybook")]
#[command(about = "Book hospital visits, doctor appointments, medicines and lab tests")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Book one of each kind against the built-in catalog
    Demo,
    /// Step through the booking wizard
    Interactive {
        /// Booking kind to start with (hospital, doctor, pharmacy, lab)
        #[arg(long)]
        kind: Option<BookingKind>,
    },
}

struct BookingCLI {
    store: SelectionStore<InMemoryCatalog>,
    submitter: InMemorySubmitter,
    running: bool,
}

impl BookingCLI {
    fn new(catalog: InMemoryCatalog, grid: TimeGrid, kind: BookingKind) -> Self {
        BookingCLI {
            store: SelectionStore::new(catalog, grid, kind),
            submitter: InMemorySubmitter::new(),
            running: true,
        }
    }

    fn print_header(&self) {
        println!("\n{}", "=".repeat(60));
        println!("       eHEALTH BOOKING");
        println!("{}", "=".repeat(60));
    }

    fn print_menu(&self) {
        println!("\n--- Commands ---");
        println!("<n>        pick / toggle item n");
        println!("s <text>   search (s alone clears)");
        if derivation::show_time_grid(self.store.selection()) {
            println!("t <n>      choose time slot n");
        }
        if self.store.selection().kind() == BookingKind::Pharmacy {
            println!("+ <n>      one more of selected medicine n");
            println!("- <n>      one less of selected medicine n");
        }
        println!("b          back");
        println!("c          confirm booking");
        println!("k <kind>   switch to hospital / doctor / pharmacy / lab");
        println!("v          view bookings");
        println!("x <n>      cancel booking n");
        println!("q          quit");
        println!("{}", "-".repeat(20));
    }

    /// Read one trimmed line. End of input reads as "q".
    fn get_input(&self, prompt: &str) -> io::Result<String> {
        print!("{}: ", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok("q".to_string());
        }
        Ok(input.trim().to_string())
    }

    fn render(&self) {
        let selection = self.store.selection();
        let catalog = self.store.catalog();

        println!(
            "\n[{} booking, step {} of {}]",
            selection.kind().name(),
            selection.step(),
            selection.kind().max_step()
        );
        if let Some(entity) = selection.chosen_entity() {
            println!("Chosen: {} ({})", entity.name(), entity.location_label());
        }
        if selection.kind() == BookingKind::Hospital {
            if let Some(doctor) = selection.chosen_doctor() {
                println!("Doctor: {} - {}", doctor.name, doctor.specialty);
            }
        }
        if !selection.search_term().is_empty() {
            println!("Search: \"{}\"", selection.search_term());
        }

        match derivation::visible_listing(selection, catalog) {
            Listing::Entities(entities) => {
                println!("\nChoose a {}:", selection.kind());
                for (i, entity) in entities.iter().enumerate() {
                    match entity {
                        Entity::Doctor(d) => {
                            println!("  {}. {} - {} ({})", i + 1, d.name, d.specialty, d.location_label)
                        }
                        other => println!("  {}. {} ({})", i + 1, other.name(), other.location_label()),
                    }
                }
                if entities.is_empty() {
                    println!("  (nothing matches)");
                }
            }
            Listing::SubItems(items) => {
                println!();
                for (i, item) in items.iter().enumerate() {
                    let marker = match item {
                        SubItem::Medicine(m) if selection.chosen_medicines().contains_key(&m.id) => "[x]",
                        SubItem::Test(t) if selection.chosen_tests().contains_key(&t.id) => "[x]",
                        SubItem::Medicine(_) | SubItem::Test(_) => "[ ]",
                        SubItem::Doctor(_) => "",
                    };
                    match item {
                        SubItem::Doctor(d) => println!("  {}. {} - {}", i + 1, d.name, d.specialty),
                        SubItem::Medicine(m) => println!(
                            "  {}. {} {} {}",
                            i + 1,
                            marker,
                            m.name,
                            format_price(m.unit_price)
                        ),
                        SubItem::Test(t) => {
                            println!("  {}. {} {} {}", i + 1, marker, t.name, format_price(t.price))
                        }
                    }
                }
                if items.is_empty() {
                    println!("  (nothing matches)");
                }
            }
            Listing::None => {}
        }

        let lines = derivation::selected_medicines_view(selection);
        if !lines.is_empty() {
            println!("\nCart:");
            for (i, line) in lines.iter().enumerate() {
                println!(
                    "  {}. {} x{} = {}",
                    i + 1,
                    line.medicine.name,
                    line.quantity,
                    format_price(line.line_total)
                );
            }
            println!("  Total: {}", format_price(derivation::medicines_total(selection)));
        }

        let tests = derivation::selected_tests_view(selection);
        if !tests.is_empty() {
            println!(
                "\n{} test(s) selected, total {}",
                tests.len(),
                format_price(derivation::tests_total(selection))
            );
        }

        if derivation::show_time_grid(selection) {
            println!("\nTime slots:");
            for (i, slot) in self.store.wizard().grid().slots().iter().enumerate() {
                let marker = if selection.chosen_time_slot() == Some(slot) { "*" } else { " " };
                println!("  {}{}. {}", marker, i + 1, slot);
            }
        }

        if self.store.can_confirm() {
            println!("\nReady to confirm (c).");
        }
    }

    fn pick(&mut self, index: usize) {
        let selection = self.store.selection();
        let action = match derivation::visible_listing(selection, self.store.catalog()) {
            Listing::Entities(entities) => entities.get(index).cloned().map(WizardAction::SelectEntity),
            Listing::SubItems(items) => items.get(index).cloned().map(|item| match item {
                SubItem::Doctor(d) => WizardAction::SelectDoctor(d),
                SubItem::Medicine(m) => WizardAction::ToggleMedicine(m),
                SubItem::Test(t) => WizardAction::ToggleTest(t),
            }),
            Listing::None => None,
        };

        match action {
            Some(action) => {
                self.store.dispatch(action);
            }
            None => println!("No item {}", index + 1),
        }
    }

    fn choose_slot(&mut self, index: usize) {
        let label = self
            .store
            .wizard()
            .grid()
            .slots()
            .get(index)
            .map(|slot| slot.label().to_string());
        match label {
            Some(label) => {
                if !self.store.dispatch(WizardAction::SelectTimeSlot(label)) {
                    println!("Time slot not changed");
                }
            }
            None => println!("No time slot {}", index + 1),
        }
    }

    fn adjust_quantity(&mut self, index: usize, delta: i32) {
        let medicine_id = self
            .store
            .selection()
            .chosen_medicines()
            .get_index(index)
            .map(|(id, _)| id.clone());
        match medicine_id {
            Some(medicine_id) => {
                self.store
                    .dispatch(WizardAction::SetMedicineQuantity { medicine_id, delta });
            }
            None => println!("No selected medicine {}", index + 1),
        }
    }

    fn confirm(&mut self) {
        match self.store.confirm(&mut self.submitter) {
            Ok(confirmation) => {
                println!("\nBooking confirmed: {}", confirmation.summary);
                println!("Confirmation ID: {}...", &confirmation.confirmation_id[..8]);
            }
            Err(e) => println!("\nCould not confirm: {}", e),
        }
    }

    fn view_bookings(&self) {
        let bookings = self.submitter.bookings();
        if bookings.is_empty() {
            println!("\nNo bookings yet");
            return;
        }

        println!("\n--- Bookings ({}) ---", bookings.len());
        for (i, record) in bookings.iter().enumerate() {
            println!(
                "  {}. [{:8}] {} ({})",
                i + 1,
                record.confirmation.kind.name(),
                record.confirmation.summary,
                record.confirmation.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    fn cancel_booking(&mut self, index: usize) {
        let id = self
            .submitter
            .bookings()
            .get(index)
            .map(|record| record.confirmation.confirmation_id.clone());
        match id {
            Some(id) if self.submitter.cancel(&id) => println!("\nBooking {} cancelled", index + 1),
            _ => println!("\nNo booking {}", index + 1),
        }
    }

    fn handle(&mut self, input: &str) {
        let (command, arg) = match input.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (input, ""),
        };
        let number = || arg.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1);

        if let Ok(n) = command.parse::<usize>() {
            if n > 0 {
                self.pick(n - 1);
            }
            return;
        }

        match (command, number()) {
            ("s", _) => {
                self.store.dispatch(WizardAction::SetSearchTerm(arg.to_string()));
            }
            ("t", Some(i)) => self.choose_slot(i),
            ("+", Some(i)) => self.adjust_quantity(i, 1),
            ("-", Some(i)) => self.adjust_quantity(i, -1),
            ("b", _) => {
                self.store.dispatch(WizardAction::GoBack);
            }
            ("c", _) => self.confirm(),
            ("k", _) => match arg.parse::<BookingKind>() {
                Ok(kind) => {
                    self.store.dispatch(WizardAction::ChangeKind(kind));
                }
                Err(e) => println!("{}", e),
            },
            ("v", _) => self.view_bookings(),
            ("x", Some(i)) => self.cancel_booking(i),
            ("q", _) => {
                self.running = false;
                println!("\nGoodbye!");
            }
            _ => println!("Invalid choice"),
        }
    }

    fn run(&mut self) -> io::Result<()> {
        self.print_header();

        while self.running {
            self.render();
            self.print_menu();
            let input = self.get_input("Enter choice")?;
            self.handle(&input);
        }
        Ok(())
    }
}

fn run_demo() -> anyhow::Result<()> {
    println!("\n--- Running Demo ---");

    let catalog = InMemoryCatalog::demo();
    let grid = TimeGrid::default();
    let mut submitter = InMemorySubmitter::new();

    let entity = |kind: BookingKind, id: &str| {
        catalog
            .find_entity(kind, id)
            .ok_or_else(|| anyhow!("demo catalog has no {} '{}'", kind, id))
    };
    let sub_item = |kind: BookingKind, parent: &str, id: &str| {
        catalog
            .find_sub_item(kind, parent, id)
            .ok_or_else(|| anyhow!("demo catalog has no item '{}' under '{}'", id, parent))
    };

    let mut scripts: Vec<(BookingKind, Vec<WizardAction>)> = Vec::new();

    let kumar = match sub_item(BookingKind::Hospital, "h1", "d1")? {
        SubItem::Doctor(d) => d,
        other => return Err(anyhow!("expected a doctor, got {:?}", other)),
    };
    scripts.push((
        BookingKind::Hospital,
        vec![
            WizardAction::SelectEntity(entity(BookingKind::Hospital, "h1")?),
            WizardAction::SelectDoctor(kumar),
            WizardAction::SelectTimeSlot("10:00 AM".into()),
        ],
    ));

    scripts.push((
        BookingKind::Doctor,
        vec![
            WizardAction::SetSearchTerm("pediatrics".into()),
            WizardAction::SelectEntity(entity(BookingKind::Doctor, "d5")?),
            WizardAction::SelectTimeSlot("11:00 AM".into()),
        ],
    ));

    let mut pharmacy = vec![WizardAction::SelectEntity(entity(BookingKind::Pharmacy, "p1")?)];
    for id in ["m1", "m3"] {
        if let SubItem::Medicine(m) = sub_item(BookingKind::Pharmacy, "p1", id)? {
            pharmacy.push(WizardAction::ToggleMedicine(m));
        }
    }
    pharmacy.push(WizardAction::SetMedicineQuantity {
        medicine_id: "m1".into(),
        delta: 1,
    });
    scripts.push((BookingKind::Pharmacy, pharmacy));

    let mut lab = vec![WizardAction::SelectEntity(entity(BookingKind::Lab, "l1")?)];
    for id in ["t1", "t2"] {
        if let SubItem::Test(t) = sub_item(BookingKind::Lab, "l1", id)? {
            lab.push(WizardAction::ToggleTest(t));
        }
    }
    lab.push(WizardAction::SelectTimeSlot("09:00 AM".into()));
    scripts.push((BookingKind::Lab, lab));

    for (kind, actions) in scripts {
        let mut store = SelectionStore::new(&catalog, grid.clone(), kind);
        for action in actions {
            store.dispatch(action);
        }
        let confirmation = store
            .confirm(&mut submitter)
            .with_context(|| format!("demo {} booking failed", kind))?;
        println!("  [{:8}] {}", kind.name(), confirmation.summary);
    }

    println!("\n{} bookings confirmed", submitter.bookings().len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("easybook=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    match Cli::parse().command {
        Some(Commands::Demo) => run_demo()?,
        Some(Commands::Interactive { kind }) => {
            let catalog = config.load_catalog()?;
            let kind = kind.unwrap_or(config.default_kind());
            BookingCLI::new(catalog, config.time_grid().clone(), kind).run()?;
        }
        None => {
            let catalog = config.load_catalog()?;
            BookingCLI::new(catalog, config.time_grid().clone(), config.default_kind()).run()?;
        }
    }

    Ok(())
}
