// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    ]
}

fn scope_args() -> [Arg; 2] {
    [
        Arg::new("trip")
            .long("trip")
            .help("Restrict to a trip (defaults to the selected trip)"),
        Arg::new("all")
            .long("all")
            .action(ArgAction::SetTrue)
            .conflicts_with("trip")
            .help("Ignore the selected trip and use every expense"),
    ]
}

fn pair_args() -> [Arg; 2] {
    [
        Arg::new("from")
            .long("from")
            .required(true)
            .help("Debtor name"),
        Arg::new("to")
            .long("to")
            .required(true)
            .help("Creditor name"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("splitclip")
        .version(clap::crate_version!())
        .about("Group expense splitting and debt settlement")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("member")
                .about("Manage members")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("trip").long("trip").help("Also join this trip")),
                )
                .subcommand(Command::new("list").args(json_args()))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
                .subcommand(
                    Command::new("rename")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                ),
        )
        .subcommand(
            Command::new("trip")
                .about("Manage trips and the selected trip")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("members")
                                .long("members")
                                .help("Comma separated member names"),
                        ),
                )
                .subcommand(Command::new("list").args(json_args()))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
                .subcommand(
                    Command::new("join")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("member").long("member").required(true)),
                )
                .subcommand(
                    Command::new("select").arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("clear").about("Clear the selected trip")),
        )
        .subcommand(
            Command::new("expense")
                .about("Record and list expenses")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("payer").long("payer").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("currency").long("currency").required(true))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .default_value("General"),
                        )
                        .arg(
                            Arg::new("description")
                                .long("description")
                                .default_value(""),
                        )
                        .arg(
                            Arg::new("split")
                                .long("split")
                                .help("Explicit shares: name=amount,..."),
                        )
                        .arg(
                            Arg::new("equal")
                                .long("equal")
                                .conflicts_with("split")
                                .help("Split evenly over these names"),
                        )
                        .arg(
                            Arg::new("earned")
                                .long("earned")
                                .help("Amount the payer keeps (rebate, cashback)"),
                        )
                        .arg(Arg::new("trip").long("trip"))
                        .arg(
                            Arg::new("no_trip")
                                .long("no-trip")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("trip"),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .arg(Arg::new("currency").long("currency"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .args(scope_args())
                        .args(json_args()),
                )
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("settle")
                .about("Balances, settlement plans and payments")
                .subcommand(
                    Command::new("balances")
                        .arg(Arg::new("currency").long("currency"))
                        .args(scope_args())
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("plan")
                        .about("Fewest transfers that settle everyone")
                        .arg(Arg::new("currency").long("currency"))
                        .args(scope_args())
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("owed")
                        .about("Outstanding debt from one member to another")
                        .args(pair_args())
                        .arg(Arg::new("currency").long("currency").required(true))
                        .args(scope_args()),
                )
                .subcommand(
                    Command::new("breakdown")
                        .about("Expenses behind one member's debt to another")
                        .args(pair_args())
                        .arg(Arg::new("currency").long("currency").required(true))
                        .args(scope_args())
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("mark")
                        .about("Mark everything owed so far as paid")
                        .args(pair_args()),
                )
                .subcommand(Command::new("unmark").args(pair_args()))
                .subcommand(
                    Command::new("pay")
                        .about("Record a settlement payment")
                        .args(pair_args())
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("received").long("received"))
                        .arg(Arg::new("change").long("change"))
                        .arg(Arg::new("forgiven").long("forgiven"))
                        .arg(
                            Arg::new("expenses")
                                .long("expenses")
                                .help("Comma separated expense ids the payment covers"),
                        ),
                )
                .subcommand(
                    Command::new("payments")
                        .arg(Arg::new("from").long("from"))
                        .arg(Arg::new("to").long("to"))
                        .args(json_args()),
                )
                .subcommand(Command::new("unpay").arg(Arg::new("id").long("id").required(true)))
                .subcommand(
                    Command::new("paid")
                        .about("Toggle the paid mark on one expense")
                        .args(pair_args())
                        .arg(Arg::new("expense").long("expense").required(true))
                        .arg(Arg::new("undo").long("undo").action(ArgAction::SetTrue)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Cross-currency reports")
                .subcommand(
                    Command::new("totals")
                        .arg(Arg::new("currency").long("currency"))
                        .args(scope_args())
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("categories")
                        .arg(Arg::new("currency").long("currency"))
                        .args(scope_args())
                        .args(json_args()),
                ),
        )
        .subcommand(
            Command::new("fx")
                .about("Currency rates")
                .subcommand(
                    Command::new("set-base")
                        .arg(Arg::new("currency").long("currency").required(true)),
                )
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("base").long("base").required(true))
                        .arg(Arg::new("quote").long("quote").required(true))
                        .arg(Arg::new("rate").long("rate").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("fetch").arg(
                        Arg::new("days")
                            .long("days")
                            .value_parser(value_parser!(usize)),
                    ),
                )
                .subcommand(
                    Command::new("convert")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                ),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("expenses")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(Command::new("doctor").about("Check the ledger for inconsistencies"))
}
