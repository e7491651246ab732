//! Dumps the linkage metadata of one module file.

use std::{env, io, process::ExitCode};

use colored::Colorize;

fn main() -> ExitCode {
	let mut args = env::args().skip(1);
	let path = match (args.next(), args.next()) {
		(Some(path), None) => path,
		_ => {
			println!("dumpolf <module file name>");
			return ExitCode::SUCCESS;
		}
	};

	let mut binary = match olfmeta::open_binary(&path) {
		Ok(file) => file,
		Err(err) => {
			eprintln!("{} {err}", "error:".red().bold());
			return ExitCode::FAILURE;
		}
	};

	let metadata = olfmeta::module_metadata(&mut binary);
	let executable = path.to_ascii_lowercase().ends_with(".exe");

	if let Err(err) = olfmeta::report::write_report(&mut io::stdout(), &metadata, executable) {
		eprintln!("{} {err}", "error:".red().bold());
		return ExitCode::FAILURE;
	}

	ExitCode::SUCCESS
}
