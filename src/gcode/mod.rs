//! Module which provides dab plan -> GCode post-processing
use std::collections::HashMap;
use std::io::{self, Write};

use tera::{Context, Tera, Value};
use thiserror::Error;
use tracing::debug;

use crate::plotter::{PenPlan, PenRegistry};

/// Templates every post machine has to provide.
///
/// * `prelude` - written once at the top of the program.
/// * `travel` - move to `x`, `y`, `z`.
/// * `hop` - move to `x`, `y` at the current height.
/// * `plunge` - move to `z` only.
pub const REQUIRED_TEMPLATES: [&str; 4] = ["prelude", "travel", "hop", "plunge"];

/// List of all available machines as an Enum
pub enum DabPostMachines {
    /// Metric G01 moves with fixed-width, zero-padded coordinates.
    FixedWidthG01,
    CustomMachine(Tera),
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post template is missing '{0}'")]
    MissingTemplate(&'static str),
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error("failed to write program: {0}")]
    Io(#[from] io::Error),
}

/// Heights used around every pen pickup and every dab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DabHeights {
    /// Safe travel height for pen changes.
    pub ceiling: f64,
    /// How far above the contact height the pen rises after each dab.
    pub lift: f64,
}

/// Formats a number as a 6 character, 2 decimal, zero padded field.
///
/// Zero padding is sign-aware: `-2` becomes `-02.00`, never `0-2.00`.
fn mm_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let mm = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg(format!("'{}' is not a coordinate", value)))?;
    Ok(Value::String(format!("{:06.2}", mm)))
}

impl DabPostMachines {
    /// Getter for machine templates for the gcode processor. Custom machines
    /// get the `mm` filter registered and are checked for the required templates.
    pub fn get_machine(machine: DabPostMachines) -> Result<Tera, PostError> {
        let mut post_template = match machine {
            DabPostMachines::FixedWidthG01 => {
                let mut fixed = Tera::default();
                fixed.register_filter("mm", mm_filter);
                fixed.add_raw_templates(vec![
                    ("prelude", "G21"),
                    ("travel", "G01 X{{x|mm}} Y{{y|mm}} Z{{z|mm}}"),
                    ("hop", "G01 X{{x|mm}} Y{{y|mm}}        "),
                    ("plunge", "G01                 Z{{z|mm}}"),
                ])?;
                fixed
            }
            DabPostMachines::CustomMachine(custom) => custom,
        };
        post_template.register_filter("mm", mm_filter);
        for name in REQUIRED_TEMPLATES {
            if !post_template.get_template_names().any(|n| n == name) {
                return Err(PostError::MissingTemplate(name));
            }
        }
        Ok(post_template)
    }
}

fn emit(
    program: &mut Vec<String>,
    post_template: &Tera,
    name: &str,
    context: &Context,
) -> Result<(), PostError> {
    program.extend(
        post_template
            .render(name, context)?
            .split('\n')
            .map(|s| s.to_string()),
    );
    Ok(())
}

fn xyz(x: f64, y: f64, z: f64) -> Context {
    let mut context = Context::new();
    context.insert("x", &x);
    context.insert("y", &y);
    context.insert("z", &z);
    context
}

fn z(z: f64) -> Context {
    let mut context = Context::new();
    context.insert("z", &z);
    context
}

/// Given pens and their mapped plans (index-aligned), generate the program.
///
/// Each pen with at least one machine coordinate gets a pickup (travel to its
/// home at ceiling height, down to the home Z, back to ceiling), one
/// move/down/lift dab per point, and a final return to ceiling. Pens with no
/// points produce nothing.
pub fn post(
    pens: &PenRegistry,
    plans: &[PenPlan],
    heights: &DabHeights,
    post_template: &Tera,
) -> Result<Vec<String>, PostError> {
    let mut program: Vec<String> = Vec::new();
    emit(&mut program, post_template, "prelude", &Context::new())?;
    for (pen, plan) in pens.iter().zip(plans.iter()) {
        if plan.machine.is_empty() {
            continue;
        }
        debug!(pen = %pen.label, dabs = plan.machine.len(), "Posting pen");
        let home = &pen.abs_home;
        emit(&mut program, post_template, "travel", &xyz(home.x, home.y, heights.ceiling))?;
        emit(&mut program, post_template, "plunge", &z(home.z))?;
        emit(&mut program, post_template, "plunge", &z(heights.ceiling))?;
        for location in plan.machine.iter() {
            emit(&mut program, post_template, "hop", &xyz(location.x, location.y, location.z))?;
            emit(&mut program, post_template, "plunge", &z(location.z))?;
            emit(&mut program, post_template, "plunge", &z(location.z + heights.lift))?;
        }
        emit(&mut program, post_template, "plunge", &z(heights.ceiling))?;
    }
    Ok(program)
}

/// Writes the program one line at a time.
pub fn write_program<W: Write>(program: &[String], out: &mut W) -> Result<(), PostError> {
    for line in program {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plotter::{grid_point, Pen};
    use nalgebra::Vector3;
    use pretty_assertions::assert_eq;

    fn heights() -> DabHeights {
        DabHeights {
            ceiling: 200.,
            lift: 1.,
        }
    }

    fn one_pen() -> PenRegistry {
        PenRegistry::new(vec![Pen::new(
            "Black",
            "#000000",
            Vector3::new(0., 10., 0.),
            &Vector3::new(110., 0., 60.),
        )
        .unwrap()])
    }

    #[test]
    fn test_post() {
        let post_template = DabPostMachines::get_machine(DabPostMachines::FixedWidthG01).unwrap();
        let mut plan = PenPlan::new();
        plan.pixels = vec![grid_point(0, 0), grid_point(0, 1)];
        plan.machine = vec![Vector3::new(0., 50., 10.), Vector3::new(2., 50., 10.)];
        let program = post(&one_pen(), &[plan], &heights(), &post_template).unwrap();
        assert_eq!(
            program,
            vec![
                "G21",
                "G01 X110.00 Y010.00 Z200.00",
                "G01                 Z060.00",
                "G01                 Z200.00",
                "G01 X000.00 Y050.00        ",
                "G01                 Z010.00",
                "G01                 Z011.00",
                "G01 X002.00 Y050.00        ",
                "G01                 Z010.00",
                "G01                 Z011.00",
                "G01                 Z200.00",
            ]
        );
    }

    #[test]
    fn test_empty_plans_only_prelude() {
        let post_template = DabPostMachines::get_machine(DabPostMachines::FixedWidthG01).unwrap();
        let program = post(&one_pen(), &[PenPlan::new()], &heights(), &post_template).unwrap();
        assert_eq!(program, vec!["G21"]);
    }

    #[test]
    fn test_mm_field_format() {
        let fmt = |v: f64| mm_filter(&Value::from(v), &HashMap::new()).unwrap();
        assert_eq!(fmt(1.5), Value::String("001.50".into()));
        assert_eq!(fmt(123.456), Value::String("123.46".into()));
        assert_eq!(fmt(-2.), Value::String("-02.00".into()));
        assert!(mm_filter(&Value::from("x"), &HashMap::new()).is_err());
    }

    #[test]
    fn test_custom_machine() {
        let mut custom = Tera::default();
        custom
            .add_raw_templates(vec![
                ("prelude", "G21\nG90"),
                ("travel", "G0 X{{x|mm}} Y{{y|mm}} Z{{z|mm}}"),
                ("hop", "G0 X{{x|mm}} Y{{y|mm}}"),
                ("plunge", "G1 Z{{z|mm}}"),
            ])
            .unwrap();
        let post_template = DabPostMachines::get_machine(DabPostMachines::CustomMachine(custom)).unwrap();
        let program = post(&one_pen(), &[PenPlan::new()], &heights(), &post_template).unwrap();
        assert_eq!(program, vec!["G21", "G90"]);
    }

    #[test]
    fn test_custom_machine_missing_template() {
        let mut custom = Tera::default();
        custom.add_raw_template("prelude", "G21").unwrap();
        let err = DabPostMachines::get_machine(DabPostMachines::CustomMachine(custom)).unwrap_err();
        assert!(matches!(err, PostError::MissingTemplate("travel")));
    }

    #[test]
    fn test_write_program() {
        let mut out: Vec<u8> = Vec::new();
        write_program(&["G21".to_string(), "G01                 Z200.00".to_string()], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "G21\nG01                 Z200.00\n");
    }
}
