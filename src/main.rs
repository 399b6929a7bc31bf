use neurosim::prelude::*;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return;
    }
    if args.len() >= 2 && args[1] == "competitive-demo" {
        run_competitive_demo();
        return;
    }

    if args.len() >= 2 {
        eprintln!("Unknown command: {}", args[1]);
        print_help();
        std::process::exit(2);
    }

    run_hopfield_demo();
}

fn print_help() {
    println!("neurosim (classical neural network simulation engine)");
    println!("usage:");
    println!("  cargo run");
    println!("  cargo run -- competitive-demo");
    println!("  cargo run -- --help");
}

// Associative memory demo:
// - store two patterns in an 8-neuron Hopfield net
// - corrupt one of them and watch recall converge back
fn run_hopfield_demo() {
    let patterns: [[f64; 8]; 2] = [
        [1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
    ];

    let mut hopfield = match Hopfield::new(8) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("construction failed: {e}");
            std::process::exit(1);
        }
    };
    // Blank slate so only the trained traces shape recall.
    for &sid in &hopfield.network().synapse_ids().to_vec() {
        hopfield.network_mut().set_strength(sid, 0.0);
    }

    for pattern in &patterns {
        hopfield.set_pattern(pattern).expect("pattern length");
        hopfield.train().expect("shared bounds");
        println!("stored  {}", render(pattern));
    }

    // Corrupt two bits of the first pattern.
    let mut cue = patterns[0];
    cue[1] = -cue[1];
    cue[6] = -cue[6];
    hopfield.set_pattern(&cue).expect("pattern length");
    println!("cue     {}", render(&cue));

    for sweep in 1..=4 {
        hopfield.update();
        println!("sweep {sweep} {}", render(&hopfield.pattern()));
    }
}

// Unsupervised clustering demo: two cluster prototypes with noise, and a
// two-output competitive net that learns to separate them.
fn run_competitive_demo() {
    let params = CompetitiveParams::default()
        .with_learning_rate(0.3)
        .with_normalize_inputs(true);
    let mut net = match Competitive::new(4, 2, params) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("construction failed: {e}");
            std::process::exit(1);
        }
    };

    let prototypes: [[f64; 4]; 2] = [[1.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 1.0]];

    for epoch in 0..20 {
        for (cluster, prototype) in prototypes.iter().enumerate() {
            let winner = net.train(prototype).expect("pattern length");
            if epoch % 5 == 0 {
                println!("epoch {epoch:2} cluster {cluster} -> output {winner}");
            }
        }
    }

    // After training the two prototypes should map to distinct outputs.
    let a = net.compete(&prototypes[0]).expect("pattern length");
    let b = net.compete(&prototypes[1]).expect("pattern length");
    println!("final   cluster 0 -> output {a}, cluster 1 -> output {b}");
    for index in 0..2 {
        let weights = net.incoming_weights(index).expect("output index");
        let pretty: Vec<String> = weights.iter().map(|w| format!("{w:.2}")).collect();
        println!("output {index} incoming weights [{}]", pretty.join(", "));
    }
}

fn render(pattern: &[f64]) -> String {
    pattern
        .iter()
        .map(|&v| if v > 0.0 { '+' } else { '-' })
        .collect()
}
