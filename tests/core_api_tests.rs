use cogsim::core::data::{ColumnValue, Record, TableBinding};
use cogsim::core::memory::declarative::{
    PORT_CUE, PORT_ENCODE, PORT_RETRIEVAL, PORT_RETRIEVAL_PROBABILITY, PORT_RETRIEVAL_TIME,
};
use cogsim::{
    CoreError, CoreResult, DeclarativeConfig, DeclarativeMemory, Direction, Extractor, Model,
    ModelConfig, Module, ModuleBase, Port, PortRef, PortSet, Slots,
};

fn slots(pairs: &[(&str, &str)]) -> Slots {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Test module: turns a raw stimulus word into a typed retrieval cue
struct Perception {
    base: ModuleBase,
}

impl Perception {
    fn new(name: &str) -> Self {
        let mut base = ModuleBase::new(name);
        base.ports_mut()
            .add_input(Port::symbolic("stimulus", Direction::In))
            .unwrap();
        base.ports_mut()
            .add_output(Port::symbolic("percept", Direction::Out))
            .unwrap();
        Self { base }
    }
}

impl Module for Perception {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn ports(&self) -> &PortSet {
        self.base.ports()
    }

    fn ports_mut(&mut self) -> &mut PortSet {
        self.base.ports_mut()
    }

    fn run(&mut self) -> CoreResult<f64> {
        let stimulus = self
            .base
            .ports_mut()
            .input_mut("stimulus")
            .filter(|p| p.is_fresh())
            .map(|p| p.consume());
        if let Some(value) = stimulus {
            if let Some(seen) = value.as_symbolic() {
                let mut percept = Slots::new();
                if let Some(word) = seen.get("word") {
                    percept.insert("type".to_string(), word.clone());
                }
                percept.insert("modality".to_string(), "visual".to_string());
                self.base
                    .ports_mut()
                    .output_mut("percept")
                    .unwrap()
                    .modify(&percept)?;
            }
        }
        Ok(0.05)
    }
}

fn seeded_memory_model(seed: u64) -> Model {
    let mut model = Model::new();
    let mut memory = DeclarativeMemory::with_seed("memory", seed);
    memory.apply_config(&DeclarativeConfig::default()).unwrap();
    model.add_module(Box::new(memory)).unwrap();
    model
}

fn encode_through_model(model: &mut Model, contents: &Slots) {
    model
        .input_port_mut(&PortRef::new("memory", PORT_ENCODE))
        .unwrap()
        .modify(contents)
        .unwrap();
    model.run().unwrap();
}

#[test]
fn test_encode_and_retrieve_through_the_model_loop() {
    let mut model = seeded_memory_model(42);
    let fact = slots(&[("name", "fido"), ("type", "dog")]);

    encode_through_model(&mut model, &fact);
    model.clock_mut().set_time(5.0).unwrap();
    encode_through_model(&mut model, &fact);
    model.clock_mut().set_time(10.0).unwrap();

    model
        .input_port_mut(&PortRef::new("memory", PORT_CUE))
        .unwrap()
        .modify(&slots(&[("type", "dog")]))
        .unwrap();
    model.run().unwrap();

    let retrieval = model
        .output_port(&PortRef::new("memory", PORT_RETRIEVAL))
        .unwrap()
        .value()
        .as_symbolic()
        .unwrap()
        .clone();
    assert_eq!(retrieval, fact);

    let latency = model
        .output_port(&PortRef::new("memory", PORT_RETRIEVAL_TIME))
        .unwrap()
        .value()
        .as_numeric()
        .unwrap();
    assert!(latency > 0.0);

    let probability = model
        .output_port(&PortRef::new("memory", PORT_RETRIEVAL_PROBABILITY))
        .unwrap()
        .value()
        .as_numeric()
        .unwrap();
    assert!(probability > 0.0 && probability < 1.0);
}

#[test]
fn test_retrieval_miss_publishes_failure_latency() {
    let mut model = seeded_memory_model(42);
    // noise 0.2, threshold 0, latency factor 1 -> failure latency exp(0) = 1
    model
        .input_port_mut(&PortRef::new("memory", PORT_CUE))
        .unwrap()
        .modify(&slots(&[("type", "bird")]))
        .unwrap();
    model.run().unwrap();

    let retrieval = model
        .output_port(&PortRef::new("memory", PORT_RETRIEVAL))
        .unwrap()
        .value()
        .as_symbolic()
        .unwrap()
        .clone();
    assert!(retrieval.is_empty());

    let latency = model
        .output_port(&PortRef::new("memory", PORT_RETRIEVAL_TIME))
        .unwrap()
        .value()
        .as_numeric()
        .unwrap();
    assert!((latency - 1.0_f64).abs() < 1e-12);
}

#[test]
fn test_perception_feeds_memory_over_a_connection() {
    let mut model = seeded_memory_model(7);
    model.add_module(Box::new(Perception::new("perception"))).unwrap();
    // only the "type" slot of the percept reaches the cue
    model
        .connect(
            PortRef::new("perception", "percept"),
            PortRef::new("memory", PORT_CUE),
            Some(Extractor::Slot("type".to_string())),
        )
        .unwrap();

    encode_through_model(&mut model, &slots(&[("type", "dog"), ("sound", "woof")]));
    encode_through_model(&mut model, &slots(&[("type", "cat"), ("sound", "meow")]));
    model.clock_mut().set_time(3.0).unwrap();

    model
        .input_port_mut(&PortRef::new("perception", "stimulus"))
        .unwrap()
        .modify(&slots(&[("word", "cat")]))
        .unwrap();
    model.run().unwrap();

    let retrieval = model
        .output_port(&PortRef::new("memory", PORT_RETRIEVAL))
        .unwrap()
        .value()
        .as_symbolic()
        .unwrap()
        .clone();
    assert_eq!(retrieval, slots(&[("type", "cat"), ("sound", "meow")]));
}

#[test]
fn test_fixed_seed_reproduces_model_level_retrievals() {
    let mut sequences = Vec::new();
    for _ in 0..2 {
        let mut model = seeded_memory_model(123);
        for animal in ["dog", "cat", "fox"] {
            encode_through_model(&mut model, &slots(&[("type", animal)]));
        }
        model.clock_mut().set_time(2.0).unwrap();

        let mut sequence = Vec::new();
        for _ in 0..8 {
            model
                .input_port_mut(&PortRef::new("memory", PORT_CUE))
                .unwrap()
                .set_value(cogsim::PortValue::Symbolic(Slots::new()))
                .unwrap();
            model.run().unwrap();
            let retrieval = model
                .output_port(&PortRef::new("memory", PORT_RETRIEVAL))
                .unwrap()
                .value()
                .as_symbolic()
                .unwrap()
                .clone();
            sequence.push(retrieval);
        }
        sequences.push(sequence);
    }
    assert_eq!(sequences[0], sequences[1]);
}

#[test]
fn test_self_feeding_memory_overruns() {
    let mut model = Model::with_config(ModelConfig::new().with_max_cycles(8)).unwrap();
    let mut memory = DeclarativeMemory::with_seed("memory", 5);
    memory.set_encode_on_retrieval(false);
    model.add_module(Box::new(memory)).unwrap();
    // every successful retrieval becomes the next cue
    model
        .connect(
            PortRef::new("memory", PORT_RETRIEVAL),
            PortRef::new("memory", PORT_CUE),
            None,
        )
        .unwrap();

    encode_through_model(&mut model, &slots(&[("type", "dog")]));
    model.clock_mut().set_time(1.0).unwrap();
    model
        .input_port_mut(&PortRef::new("memory", PORT_CUE))
        .unwrap()
        .modify(&slots(&[("type", "dog")]))
        .unwrap();

    let result = model.run();
    assert_eq!(result, Err(CoreError::StabilizationOverrun { cycles: 8 }));
}

#[test]
fn test_table_binding_drives_paired_associates() {
    let mut model = seeded_memory_model(99);
    encode_through_model(&mut model, &slots(&[("word", "chien"), ("meaning", "dog")]));
    encode_through_model(&mut model, &slots(&[("word", "chat"), ("meaning", "cat")]));
    model.clock_mut().set_time(4.0).unwrap();

    let mut binding = TableBinding::new(["word", "meaning", "rt"]);
    binding
        .connect_input("word", &model, PortRef::new("memory", PORT_CUE), None)
        .unwrap();
    binding
        .connect_output(
            "meaning",
            &model,
            PortRef::new("memory", PORT_RETRIEVAL),
            Some("meaning"),
        )
        .unwrap();
    binding
        .connect_output(
            "rt",
            &model,
            PortRef::new("memory", PORT_RETRIEVAL_TIME),
            None,
        )
        .unwrap();

    for (word, expected) in [("chien", "dog"), ("chat", "cat")] {
        let mut record = Record::new();
        record.insert("word".to_string(), ColumnValue::Text(word.to_string()));
        let result = binding.process_record(&mut model, &record).unwrap();
        assert_eq!(
            result.get("meaning"),
            Some(&ColumnValue::Text(expected.to_string()))
        );
        match result.get("rt") {
            Some(ColumnValue::Number(latency)) => assert!(*latency > 0.0),
            other => panic!("expected a numeric rt, got {:?}", other),
        }
    }
}

#[test]
fn test_remove_module_unbinds_everything() {
    let mut model = seeded_memory_model(1);
    model.add_module(Box::new(Perception::new("perception"))).unwrap();
    model
        .connect(
            PortRef::new("perception", "percept"),
            PortRef::new("memory", PORT_CUE),
            None,
        )
        .unwrap();

    model.remove_module("perception").unwrap();
    assert!(model.connections().is_empty());
    assert!(model.module("perception").is_none());
    // memory still answers on its own
    encode_through_model(&mut model, &slots(&[("type", "dog")]));
    assert!(model.module("memory").is_some());
}
