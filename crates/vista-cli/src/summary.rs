use std::path::Path;

use console::Style;
use vista_core::background::TemporalMedianConfig;
use vista_core::frame::FrameStack;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_median_summary(config: &TemporalMedianConfig, stack: &FrameStack, output: &Path) {
    let s = Styles::new();
    let (h, w) = stack.frame_shape();

    println!();
    println!("  {}", s.title.apply_to("Temporal Median"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(15)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Source"),
        s.value.apply_to(stack.name())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!("{} x {}x{}", stack.len(), w, h))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Window"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Background"),
        s.value.apply_to(config.background_frames)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Offset"),
        s.value.apply_to(config.temporal_offset)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Mode"),
        s.method.apply_to(config.output)
    );
    println!();
}
