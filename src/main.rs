use std::process::ExitCode;

fn main() -> ExitCode {
    match sitelog_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sitelog: {e}");
            ExitCode::FAILURE
        }
    }
}
