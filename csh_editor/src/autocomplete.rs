//! Tab-completion over a lazily-loaded, per-first-character candidate set.
//!
//! Ported from the reference shell's `Autocomplete`. Behaviour (lazy reload
//! on first-character change, single-match auto-space, multi-match
//! longest-common-prefix, forward/backward cycling) is unchanged.

use heapless::{String, Vec};

/// `NAC`: max candidates sharing one first character. `FNL`: max command
/// name length.
pub struct Autocomplete<'a, const NAC: usize, const FNL: usize> {
    candidates: Vec<&'a str, NAC>,
    filtered: Vec<&'a str, NAC>,
    input: String<FNL>,
    tab_index: usize,
    first_char_loaded: Option<char>,
}

impl<'a, const NAC: usize, const FNL: usize> Default for Autocomplete<'a, NAC, FNL> {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            filtered: Vec::new(),
            input: String::new(),
            tab_index: 0,
            first_char_loaded: None,
        }
    }
}

impl<'a, const NAC: usize, const FNL: usize> Autocomplete<'a, NAC, FNL> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `get_candidates` is invoked with the input's first character (and a
    /// push callback to report each matching candidate) only when that
    /// character differs from the one last loaded. Push-style rather than
    /// slice-returning: the candidate set is typically filtered out of a
    /// caller-owned table on the fly, with nowhere to park a borrowed slice
    /// that outlives the call.
    pub fn update_input<F>(&mut self, new_input: &str, mut get_candidates: F)
    where
        F: FnMut(char, &mut dyn FnMut(&'a str)),
    {
        self.input.clear();
        let _ = self.input.push_str(new_input);
        self.filtered.clear();

        let input_str = self.input.as_str();

        let first_char = match input_str.chars().next() {
            Some(c) => c,
            None => {
                self.candidates.clear();
                self.first_char_loaded = None;
                self.tab_index = 0;
                return;
            }
        };

        if self.first_char_loaded != Some(first_char) {
            self.candidates.clear();
            let candidates = &mut self.candidates;
            get_candidates(first_char, &mut |c| {
                let _ = candidates.push(c);
            });
            self.first_char_loaded = Some(first_char);
        }

        for &c in self.candidates.iter() {
            if c.starts_with(input_str) {
                let _ = self.filtered.push(c);
            }
        }

        self.tab_index = 0;
        if self.filtered.len() == 1 {
            self.input.clear();
            let _ = self.input.push_str(self.filtered[0]);
            let _ = self.input.push(' ');
        } else if self.filtered.len() > 1 {
            self.input = Self::longest_common_prefix(&self.filtered);
        }
    }

    pub fn cycle_forward(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        self.tab_index = (self.tab_index + 1) % self.filtered.len();
        self.input.clear();
        let _ = self.input.push_str(self.filtered[self.tab_index]);
        let _ = self.input.push(' ');
    }

    pub fn cycle_backward(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        self.tab_index = if self.tab_index == 0 {
            self.filtered.len() - 1
        } else {
            self.tab_index - 1
        };
        self.input.clear();
        let _ = self.input.push_str(self.filtered[self.tab_index]);
        let _ = self.input.push(' ');
    }

    pub fn current_input(&self) -> &str {
        &self.input
    }

    pub fn filtered_candidates(&self) -> &[&'a str] {
        &self.filtered
    }

    fn longest_common_prefix(strings: &[&str]) -> String<FNL> {
        if strings.is_empty() {
            return String::new();
        }
        let mut prefix = strings[0];
        for s in strings.iter().skip(1) {
            while !s.starts_with(prefix) {
                if prefix.is_empty() {
                    break;
                }
                prefix = &prefix[..prefix.len() - 1];
            }
        }
        let mut result = String::new();
        let _ = result.push_str(prefix);
        result
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.candidates.clear();
        self.filtered.clear();
        self.first_char_loaded = None;
        self.tab_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAC: usize = 4;
    const FNL: usize = 32;

    fn get_commands_for_char(c: char, push: &mut dyn FnMut(&'static str)) {
        let names: &[&str] = match c {
            'a' => &["alpha", "alpine"],
            'b' => &["beta"],
            'g' => &["gamma", "gamut", "gambit"],
            'z' => &["zeta"],
            _ => &[],
        };
        for &name in names {
            push(name);
        }
    }

    #[test]
    fn new_is_empty() {
        let ac: Autocomplete<NAC, FNL> = Autocomplete::new();
        assert_eq!(ac.current_input(), "");
        assert_eq!(ac.filtered_candidates().len(), 0);
    }

    #[test]
    fn lazy_load_on_first_char() {
        let mut ac: Autocomplete<NAC, FNL> = Autocomplete::new();
        ac.update_input("a", get_commands_for_char);
        assert_eq!(ac.filtered_candidates().len(), 2);
        // same first char: no reload, but filtering narrows further
        ac.update_input("al", get_commands_for_char);
        assert_eq!(ac.filtered_candidates().len(), 2);
    }

    #[test]
    fn single_match_autocompletes_with_space() {
        let mut ac: Autocomplete<NAC, FNL> = Autocomplete::new();
        ac.update_input("b", get_commands_for_char);
        assert_eq!(ac.current_input(), "beta ");
    }

    #[test]
    fn multi_match_uses_longest_common_prefix() {
        let mut ac: Autocomplete<NAC, FNL> = Autocomplete::new();
        ac.update_input("g", get_commands_for_char);
        assert_eq!(ac.current_input(), "gam");
    }

    #[test]
    fn cycling_wraps_both_directions() {
        let mut ac: Autocomplete<NAC, FNL> = Autocomplete::new();
        ac.update_input("g", get_commands_for_char);
        ac.cycle_forward();
        let first = ac.current_input().to_string();
        ac.cycle_backward();
        ac.cycle_backward();
        assert_ne!(ac.current_input(), first);
    }

    #[test]
    fn empty_input_clears_state() {
        let mut ac: Autocomplete<NAC, FNL> = Autocomplete::new();
        ac.update_input("g", get_commands_for_char);
        ac.update_input("", get_commands_for_char);
        assert_eq!(ac.filtered_candidates().len(), 0);
        assert_eq!(ac.current_input(), "");
    }

    #[test]
    fn unknown_first_char_has_no_candidates() {
        let mut ac: Autocomplete<NAC, FNL> = Autocomplete::new();
        ac.update_input("q", get_commands_for_char);
        assert_eq!(ac.filtered_candidates().len(), 0);
        assert_eq!(ac.current_input(), "q");
    }
}
