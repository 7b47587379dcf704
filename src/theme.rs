//! Catppuccin Mocha accents used by the step tracer.
pub mod catppuccin {
    use nu_ansi_term::Color;
    pub struct Mocha;
    impl Mocha {
        // Base
        pub const SURFACE2: Color = Color::Rgb(108, 112, 134);  // zero cells

        // Accents
        pub const RED: Color = Color::Rgb(243, 139, 168);  // DECREMENT
        pub const GREEN: Color = Color::Rgb(166, 227, 161);  // INCREMENT
        pub const YELLOW: Color = Color::Rgb(249, 226, 175);  // head cell
        pub const BLUE: Color = Color::Rgb(137, 180, 250);  // jumps
        pub const MAUVE: Color = Color::Rgb(203, 166, 247);  // READ
        pub const PEACH: Color = Color::Rgb(250, 179, 135);  // WRITE
        pub const SKY: Color = Color::Rgb(137, 220, 235);  // moves
    }
}
