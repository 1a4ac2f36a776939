//! An oracle which shells out to z3.

use crate::expr::{Constant, ExprPool, ExprRef};
use crate::solver::smtlib;
use crate::solver::{ConstraintSet, Oracle};
use crate::Error;
use log::trace;
use num_bigint::BigUint;
use std::io::Write;
use std::process;

/// Answers oracle queries by running `z3 -in` once per query.
#[derive(Clone, Debug)]
pub struct Z3Oracle {
    binary: String,
}

impl Z3Oracle {
    /// Create an oracle using the `z3` found in `PATH`.
    pub fn new() -> Z3Oracle {
        Z3Oracle {
            binary: "z3".to_string(),
        }
    }

    /// Create an oracle using the z3 binary at the given path.
    pub fn with_binary<S: Into<String>>(binary: S) -> Z3Oracle {
        Z3Oracle {
            binary: binary.into(),
        }
    }

    fn preamble(pool: &ExprPool, constraints: &ConstraintSet, exprs: &[ExprRef]) -> Vec<String> {
        let mut roots = constraints.constraints().to_vec();
        roots.extend_from_slice(exprs);

        let mut lines = vec![
            "(set-option :produce-models true)".to_string(),
            "(set-logic QF_ABV)".to_string(),
        ];
        lines.append(&mut smtlib::declarations(pool, &roots));
        for constraint in constraints.constraints() {
            lines.push(format!(
                "(assert (= {} #b1))",
                smtlib::node_name(*constraint)
            ));
        }
        lines
    }

    fn run(&self, lines: Vec<String>) -> Result<String, Error> {
        let input = lines.join("\n");
        trace!("z3 query of {} lines", lines.len());

        let mut child = process::Command::new(&self.binary)
            .arg("-in")
            .stdin(process::Stdio::piped())
            .stdout(process::Stdio::piped())
            .stderr(process::Stdio::piped())
            .spawn()?;

        match child.stdin.take() {
            Some(mut stdin) => {
                stdin.write_all(input.as_bytes())?;
                stdin.write_all(b"\n")?;
                stdin.flush()?;
            }
            None => {
                child.kill()?;
                return Err(Error::Solver("Failed to get stdin from solver process".to_string()));
            }
        }

        let output = child.wait_with_output()?;
        let output = String::from_utf8(output.stdout)
            .map_err(|e| Error::Solver(format!("Solver output is not utf8: {}", e)))?;
        trace!("z3 answered {}", output.trim());
        Ok(output)
    }
}

impl Default for Z3Oracle {
    fn default() -> Z3Oracle {
        Z3Oracle::new()
    }
}

/// Parse the first `#x`, `#b` or `(_ bvN W)` literal in a `get-value`
/// response.
fn parse_value(output: &str, bits: usize) -> Option<Constant> {
    if let Some(position) = output.find("#x") {
        let digits: String = output[position + 2..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        return BigUint::parse_bytes(digits.as_bytes(), 16).map(|v| Constant::new_big(v, bits));
    }
    if let Some(position) = output.find("#b") {
        let digits: String = output[position + 2..]
            .chars()
            .take_while(|c| *c == '0' || *c == '1')
            .collect();
        return BigUint::parse_bytes(digits.as_bytes(), 2).map(|v| Constant::new_big(v, bits));
    }
    if let Some(position) = output.find("(_ bv") {
        let digits: String = output[position + 5..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        return BigUint::parse_bytes(digits.as_bytes(), 10).map(|v| Constant::new_big(v, bits));
    }
    None
}

impl Oracle for Z3Oracle {
    fn always_equal(
        &self,
        pool: &ExprPool,
        constraints: &ConstraintSet,
        lhs: ExprRef,
        rhs: ExprRef,
    ) -> Result<bool, Error> {
        if pool.width(lhs) != pool.width(rhs) {
            return Err(Error::Sort);
        }
        if lhs == rhs {
            return Ok(true);
        }
        let mut lines = Z3Oracle::preamble(pool, constraints, &[lhs, rhs]);
        lines.push(format!(
            "(assert (distinct {} {}))",
            smtlib::node_name(lhs),
            smtlib::node_name(rhs)
        ));
        lines.push("(check-sat)".to_string());

        let output = self.run(lines)?;
        match output.lines().next().map(|line| line.trim()) {
            Some("unsat") => Ok(true),
            Some("sat") | Some("unknown") => Ok(false),
            _ => Err(Error::Solver(format!("Unexpected solver output: {}", output))),
        }
    }

    fn evaluate(
        &self,
        pool: &ExprPool,
        constraints: &ConstraintSet,
        expr: ExprRef,
    ) -> Result<Option<Constant>, Error> {
        let mut lines = Z3Oracle::preamble(pool, constraints, &[expr]);
        lines.push("(check-sat)".to_string());
        lines.push(format!("(get-value ({}))", smtlib::node_name(expr)));

        let output = self.run(lines)?;
        let mut output_lines = output.lines();
        match output_lines.next().map(|line| line.trim()) {
            Some("sat") => {
                let rest: Vec<&str> = output_lines.collect();
                Ok(parse_value(&rest.join(" "), pool.width(expr)))
            }
            Some("unsat") | Some("unknown") => Ok(None),
            _ => Err(Error::Solver(format!("Unexpected solver output: {}", output))),
        }
    }
}
