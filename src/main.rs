use colour::{e_red_ln, green_ln_bold, grey_ln, red_ln};
use pilc::compiler::compiler_errors::{print_errors, print_formatted_error};
use pilc::compiler::compiler_warnings::print_formatted_warning;
use pilc::compiler::program::ast_nodes::ProgramBundle;
use pilc::settings::Config;
use pilc::{file_output, run_backend};
use std::path::PathBuf;
use std::{env, fs, process};

fn main() {
    let compiler_args: Vec<String> = env::args().collect();

    if compiler_args.len() < 2 {
        print_help();
        return;
    }

    let config = match get_config(&compiler_args[1..]) {
        Ok(config) => config,
        Err(e) => {
            red_ln!("{}", e);
            print_help();
            process::exit(1);
        }
    };

    // The input file is the typed program bundle the front end dumped
    let input_path = match &config.input_file {
        Some(path) => path.to_owned(),
        None => {
            red_ln!("No input file given");
            print_help();
            process::exit(1);
        }
    };

    let source = match fs::read_to_string(&input_path) {
        Ok(source) => source,
        Err(e) => {
            e_red_ln!("Error reading '{}': {}", input_path.display(), e);
            process::exit(1);
        }
    };

    let bundle: ProgramBundle = match serde_json::from_str(&source) {
        Ok(bundle) => bundle,
        Err(e) => {
            e_red_ln!(
                "'{}' is not a valid typed program bundle: {}",
                input_path.display(),
                e
            );
            process::exit(1);
        }
    };

    match run_backend(&bundle, &config) {
        Ok(output) => {
            for warning in &output.warnings {
                print_formatted_warning(warning);
            }

            if config.debug {
                dump_parser_graph(&output.pipeline);
            }

            if let Err(e) = file_output::write_artifacts(&output.pipeline, &config) {
                print_formatted_error(&e);
                process::exit(1);
            }

            green_ln_bold!(
                "Compiled pipeline '{}' ({} tables, {} actions)",
                output.pipeline.name,
                output.pipeline.num_tables,
                output.pipeline.actions.len()
            );
        }
        Err(messages) => {
            print_errors(&messages);
            process::exit(1);
        }
    }
}

fn get_config(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" => match args.next() {
                Some(path) => config.output_file = Some(PathBuf::from(path)),
                None => return Err("-o needs an output file path".to_string()),
            },
            "-i" => match args.next() {
                Some(path) => config.introspec_file = Some(PathBuf::from(path)),
                None => return Err("-i needs an output file path".to_string()),
            },
            "-g" => config.debug = true,
            "help" | "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option '{}'", arg));
            }
            _ => {
                if config.input_file.is_some() {
                    return Err("Only one input file can be given".to_string());
                }
                config.input_file = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(config)
}

// Mirrors the console dump the backend does while reconstructing the
// parser graph, for poking at a program without writing any files
fn dump_parser_graph(pipeline: &pilc::compiler::pil::pil_nodes::Pipeline) {
    for extract in &pipeline.parser.extracts {
        grey_ln!(
            "(state, extract): ({}, {} {} bytes at offset {})",
            extract.state,
            extract.header_type,
            extract.header_bytes,
            extract.field_offset
        );
    }
    for selector in &pipeline.parser.selectors {
        grey_ln!(
            "(state, selector): ({}, {} off {} len {})",
            selector.state,
            selector.header_type,
            selector.field_offset,
            selector.field_len
        );
    }
    for transitions in &pipeline.parser.transitions {
        let next: Vec<String> = transitions
            .entries
            .iter()
            .map(|e| format!("{}={:#x}", e.next_state, e.value))
            .collect();
        grey_ln!("(state, nextStates): ({}, [{}])", transitions.state, next.join(", "));
    }
}

fn print_help() {
    println!("Usage: pilc <program bundle> [options]");
    println!();
    println!("The program bundle is the typed program JSON the front end produces.");
    println!();
    println!("Options:");
    println!("  -o <file>   Write the pipeline template output to <file>");
    println!("  -i <file>   Write the introspection json to <file>");
    println!("  -g          Dump the reconstructed parser graph");
    println!("  --help      Show this help");
}
