extern crate assembler;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate vcode;

use assembler::Machine;
use vcode::ir::{self, Unit};
use vcode::{compile, Config, Interpreter};

use std::env;
use std::error::Error;
use std::process;

fn sample(name: &str) -> Option<Unit> {
    match name {
        "add1" => Some(ir::sample_add1()),
        "fact" => Some(ir::sample_fact()),
        "max" => Some(ir::sample_max()),
        _ => None,
    }
}

fn run_sample(name: &str, args: &[&str], config: &Config) -> Result<i32, Box<dyn Error>> {
    let unit = sample(name).ok_or_else(|| format!("no sample unit named {}", name))?;
    if args.len() != unit.params().len() {
        return Err(format!("{} takes {} argument(s), got {}",
                           name,
                           unit.params().len(),
                           args.len())
            .into());
    }

    let machine = Machine::interp();
    let code = compile(machine, &unit)?;
    if config.dump {
        print!("{}", code);
    }

    let mut interp = Interpreter::with_config(machine, config);
    // Parameters are values, and value N lives in register N.
    for (param, arg) in unit.params().iter().zip(args) {
        interp.set_reg(param.0, arg.parse()?);
    }
    let res = interp.run(&code)?;
    info!("{}: {} bytes, frame {}", name, code.length(), code.frame_size());
    Ok(res)
}

fn main() {
    env_logger::init();
    let config = Config::from_env();

    let args: Vec<String> = env::args().collect();
    let args_ref: Vec<&str> = args.iter().skip(1).map(|e| e.as_ref()).collect();
    let res = match args_ref.as_slice() {
        [name, rest @ ..] => run_sample(name, rest, &config),
        [] => {
            eprintln!("usage: driver <add1|fact|max> [args...]");
            process::exit(2);
        }
    };

    match res {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
