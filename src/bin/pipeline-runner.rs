//! Pipeline demo binary
//!
//! Run with: `cargo run --bin pipeline-runner -- <input-image> [output-prefix]`

use imagegraph::{
    BlurNode, BrightnessContrastNode, ChannelSplitterNode, EdgeDetectionNode, EdgeMethod,
    FileImageSink, FileImageSource, GraphEngine, InputNode, NodeGraph, OutputFormat, OutputNode,
    ThresholdMethod, ThresholdNode,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level:
    //   RUST_LOG=debug cargo run --bin pipeline-runner -- photo.jpg
    //   RUST_LOG=imagegraph=trace cargo run --bin pipeline-runner -- photo.jpg
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let input_path = args
        .next()
        .or_else(|| std::env::var("INPUT_IMAGE").ok())
        .unwrap_or_else(|| "images.jpg".to_string());
    let output_prefix = args
        .next()
        .or_else(|| std::env::var("OUTPUT_PREFIX").ok())
        .unwrap_or_else(|| "output".to_string());

    println!("Running image pipeline");
    println!("   Input:  {}", input_path);
    println!("   Output: {}_full.jpg / {}_channel.jpg", output_prefix, output_prefix);
    println!();

    // Build the classic chain: input -> brightness/contrast -> blur ->
    // threshold -> edge detection -> output, with a channel-splitter branch
    // off the threshold stage.
    let mut graph = NodeGraph::new();

    let mut input_node = InputNode::new("ImageInput");
    input_node.load_from(&FileImageSource, &input_path)?;
    let input = graph.add_node(Box::new(input_node));

    let adjust = graph.add_node(Box::new(BrightnessContrastNode::new(1.0, 0)));
    let blur = graph.add_node(Box::new(BlurNode::new(5, false)));
    let threshold = graph.add_node(Box::new(ThresholdNode::new(128.0, ThresholdMethod::Binary)));
    let edges = graph.add_node(Box::new(EdgeDetectionNode::new(
        EdgeMethod::Sobel,
        3,
        100.0,
        200.0,
        false,
    )));
    let splitter = graph.add_node(Box::new(ChannelSplitterNode::new(true)));

    let output_full = graph.add_node(Box::new(OutputNode::new(
        format!("{}_full", output_prefix),
        OutputFormat::Jpeg { quality: 90 },
    )));
    let output_channel = graph.add_node(Box::new(OutputNode::new(
        format!("{}_channel", output_prefix),
        OutputFormat::Jpeg { quality: 90 },
    )));

    graph.connect(input, adjust)?;
    graph.connect(adjust, blur)?;
    graph.connect(blur, threshold)?;
    graph.connect(threshold, edges)?;
    graph.connect(edges, output_full)?;
    graph.connect(threshold, splitter)?;
    graph.connect(splitter, output_channel)?;

    let engine = GraphEngine::new();
    engine.run(&mut graph, output_full)?;
    engine.run(&mut graph, output_channel)?;

    let sink = FileImageSink;
    for &terminal in &[output_full, output_channel] {
        let node = graph
            .node_as::<OutputNode>(terminal)
            .ok_or("terminal is not an output node")?;
        match node.save(&sink) {
            Ok(()) => println!("Saved {}", node.target_path()),
            Err(err) => println!("Skipped {}: {}", node.target_path(), err),
        }
    }

    println!();
    println!("Graph structure:");
    println!("{}", serde_json::to_string_pretty(&graph.describe())?);

    Ok(())
}
