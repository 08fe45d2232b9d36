/// Status output utilities
///
/// stdout belongs to the report payload; everything meant for a human
/// goes to stderr, with a colored prefix when stderr is a terminal.
use std::io::Write;

/// Print an error message with a colored "error" prefix to stderr.
pub fn print_error(msg: &str) {
    if !really_print_color("error", term::color::BRIGHT_RED) {
        eprint!("error");
    }
    eprintln!(": {}", msg);

    fn really_print_color(s: &str, fg: term::color::Color) -> bool {
        if let Some(ref mut t) = term::stderr() {
            if t.fg(fg).is_err() {
                return false;
            }
            let _ = t.attr(term::Attr::Bold);
            if write!(t, "{}", s).is_err() {
                return false;
            }
            let _ = t.reset();
            return true;
        }
        false
    }
}
