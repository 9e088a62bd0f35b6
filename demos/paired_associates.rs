//! Paired-associates demo: study a small French vocabulary, then test
//! recall after increasing delays and watch latency and retrieval
//! probability change with rehearsal history.
//!
//! Run with `RUST_LOG=debug` to see the stabilization loop at work.

use cogsim::core::data::{ColumnValue, Record, TableBinding};
use cogsim::core::memory::declarative::{
    PORT_CUE, PORT_ENCODE, PORT_RETRIEVAL, PORT_RETRIEVAL_PROBABILITY, PORT_RETRIEVAL_TIME,
};
use cogsim::{DeclarativeConfig, DeclarativeMemory, Model, PortRef, Slots};

fn slots(pairs: &[(&str, &str)]) -> Slots {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn study(model: &mut Model, word: &str, meaning: &str) {
    model
        .input_port_mut(&PortRef::new("memory", PORT_ENCODE))
        .expect("encode port")
        .modify(&slots(&[("word", word), ("meaning", meaning)]))
        .expect("symbolic merge");
    model.run().expect("stabilization");
}

fn main() {
    env_logger::init();

    let mut model = Model::new();
    let mut memory = DeclarativeMemory::with_seed("memory", 2024);
    memory
        .apply_config(
            &DeclarativeConfig::new()
                .with_decay_rate(0.5)
                .with_noise(0.2)
                .with_threshold(0.0)
                .with_latency_factor(1.0),
        )
        .expect("valid configuration");
    model.add_module(Box::new(memory)).expect("fresh model");

    // study phase: "chien" gets rehearsed twice, "chat" once
    study(&mut model, "chien", "dog");
    study(&mut model, "chat", "cat");
    model.clock_mut().set_time(10.0).expect("time moves forward");
    study(&mut model, "chien", "dog");

    // test phase via the tabular boundary
    let mut binding = TableBinding::new(["word", "meaning", "rt", "p"]);
    binding
        .connect_input("word", &model, PortRef::new("memory", PORT_CUE), None)
        .expect("cue mapping");
    binding
        .connect_output(
            "meaning",
            &model,
            PortRef::new("memory", PORT_RETRIEVAL),
            Some("meaning"),
        )
        .expect("retrieval mapping");
    binding
        .connect_output(
            "rt",
            &model,
            PortRef::new("memory", PORT_RETRIEVAL_TIME),
            None,
        )
        .expect("latency mapping");
    binding
        .connect_output(
            "p",
            &model,
            PortRef::new("memory", PORT_RETRIEVAL_PROBABILITY),
            None,
        )
        .expect("probability mapping");

    println!("{:<8} {:<8} {:<10} {:<10} {:<10}", "delay", "word", "meaning", "rt", "p");
    for delay in [15.0, 60.0, 300.0] {
        model.clock_mut().set_time(delay).expect("time moves forward");
        for word in ["chien", "chat", "cheval"] {
            let mut record = Record::new();
            record.insert("word".to_string(), ColumnValue::Text(word.to_string()));
            let result = binding
                .process_record(&mut model, &record)
                .expect("record drive");
            let meaning = match result.get("meaning") {
                Some(ColumnValue::Text(text)) => text.clone(),
                _ => "(miss)".to_string(),
            };
            let rt = match result.get("rt") {
                Some(ColumnValue::Number(rt)) => format!("{:.3}", rt),
                _ => "-".to_string(),
            };
            let p = match result.get("p") {
                Some(ColumnValue::Number(p)) => format!("{:.3}", p),
                _ => "-".to_string(),
            };
            println!("{:<8} {:<8} {:<10} {:<10} {:<10}", delay, word, meaning, rt, p);
        }
    }
}
